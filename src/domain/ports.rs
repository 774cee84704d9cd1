use crate::domain::model::{AuthEvent, Session, SignUpOutcome, Toast};
use crate::utils::error::Result;
use async_trait::async_trait;
use tokio::sync::broadcast;

/// 外部身分驗證服務
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn get_session(&self) -> Result<Option<Session>>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        redirect_to: Option<&str>,
    ) -> Result<SignUpOutcome>;

    async fn sign_out(&self) -> Result<()>;

    /// 丟掉 receiver 即取消訂閱
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

/// 單一實體的 embedding 服務。結果與錯誤型別由實作決定，hooks 原樣轉交
#[async_trait]
pub trait EntityEmbeddingService: Send + Sync {
    type Output: Send;
    type Error: std::fmt::Display + Send;

    async fn update_embedding(&self, id: &str) -> std::result::Result<Self::Output, Self::Error>;

    async fn handle_created(&self, id: &str) -> std::result::Result<Self::Output, Self::Error>;

    async fn handle_updated(&self, id: &str) -> std::result::Result<Self::Output, Self::Error>;

    async fn handle_activity_changed(
        &self,
        activity_id: &str,
    ) -> std::result::Result<Self::Output, Self::Error>;
}

pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);
}
