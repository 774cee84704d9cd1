use crate::config::LiveBackend;
use crate::domain::model::{AuthChangeEvent, AuthEvent, Session, SignUpOutcome, User};
use crate::domain::ports::AuthProvider;
use crate::utils::error::{CrmError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use tokio::sync::{broadcast, RwLock};

const EVENT_CHANNEL_CAPACITY: usize = 32;
/// 到期前多少秒就先刷新
const REFRESH_MARGIN_SECONDS: i64 = 10;

/// GoTrue (`/auth/v1`) REST 客戶端，session 只保存在記憶體
pub struct SupabaseAuthClient {
    client: Client,
    auth_base: String,
    anon_key: String,
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
}

impl SupabaseAuthClient {
    pub fn new(backend: &LiveBackend) -> Result<Self> {
        let client = Client::builder().timeout(backend.timeout).build()?;
        Ok(Self::with_client(client, backend))
    }

    pub fn with_client(client: Client, backend: &LiveBackend) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            client,
            auth_base: backend.auth_base(),
            anon_key: backend.anon_key.clone(),
            session: RwLock::new(None),
            events,
        }
    }

    /// 用已知的 session 啟動（例如從外部儲存還原）
    pub async fn set_session(&self, session: Session) {
        *self.session.write().await = Some(session.clone());
        self.emit(AuthChangeEvent::SignedIn, Some(session));
    }

    /// 用外部保存的 token 還原 session：先以 `GET /user` 確認 token 有效並取回使用者
    pub async fn restore_session(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<Session> {
        tracing::debug!("🔑 Restoring session via {}", self.auth_base);
        let url = format!("{}/user", self.auth_base);
        let response = self
            .client
            .get(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let user: User = check_status(response).await?.json().await?;
        let session = Session {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.unwrap_or_default().to_string(),
            token_type: "bearer".to_string(),
            expires_in: None,
            expires_at: None,
            user,
        };

        self.set_session(session.clone()).await;
        Ok(session)
    }

    pub async fn refresh_session(&self) -> Result<Session> {
        let refresh_token = self
            .session
            .read()
            .await
            .as_ref()
            .map(|s| s.refresh_token.clone())
            .ok_or_else(|| CrmError::AuthError {
                status: StatusCode::UNAUTHORIZED.as_u16(),
                message: "No session to refresh".to_string(),
            })?;

        tracing::debug!("🔄 Refreshing session");
        let url = format!("{}/token?grant_type=refresh_token", self.auth_base);
        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        let session = parse_session(check_status(response).await?.json().await?);
        *self.session.write().await = Some(session.clone());
        self.emit(AuthChangeEvent::TokenRefreshed, Some(session.clone()));
        Ok(session)
    }

    fn emit(&self, kind: AuthChangeEvent, session: Option<Session>) {
        // 沒有訂閱者時 send 會失敗，可忽略
        let _ = self.events.send(AuthEvent::new(kind, session));
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuthClient {
    async fn get_session(&self) -> Result<Option<Session>> {
        let current = self.session.read().await.clone();
        match current {
            Some(session)
                if session.expires_within(chrono::Utc::now().timestamp(), REFRESH_MARGIN_SECONDS) =>
            {
                tracing::debug!("⏰ Session expired, refreshing before returning it");
                self.refresh_session().await.map(Some)
            }
            other => Ok(other),
        }
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        tracing::debug!("📡 Signing in {} via {}", email, self.auth_base);
        let url = format!("{}/token?grant_type=password", self.auth_base);
        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let session = parse_session(check_status(response).await?.json().await?);
        *self.session.write().await = Some(session.clone());
        self.emit(AuthChangeEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        redirect_to: Option<&str>,
    ) -> Result<SignUpOutcome> {
        tracing::debug!("📡 Signing up {} via {}", email, self.auth_base);
        let url = format!("{}/signup", self.auth_base);
        let mut request = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }));

        if let Some(redirect_to) = redirect_to {
            request = request.query(&[("redirect_to", redirect_to)]);
        }

        let body: serde_json::Value = check_status(request.send().await?).await?.json().await?;

        // 自動確認時回傳完整 session，否則只有 user
        if body.get("access_token").is_some() {
            let session = parse_session(serde_json::from_value(body)?);
            *self.session.write().await = Some(session.clone());
            self.emit(AuthChangeEvent::SignedIn, Some(session.clone()));
            Ok(SignUpOutcome {
                user: Some(session.user.clone()),
                session: Some(session),
            })
        } else {
            let user = body
                .get("user")
                .cloned()
                .unwrap_or(body);
            let user: User = serde_json::from_value(user)?;
            Ok(SignUpOutcome {
                user: Some(user),
                session: None,
            })
        }
    }

    async fn sign_out(&self) -> Result<()> {
        let access_token = self
            .session
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone());

        if let Some(token) = access_token {
            let url = format!("{}/logout", self.auth_base);
            let response = self
                .client
                .post(&url)
                .header("apikey", &self.anon_key)
                .bearer_auth(token)
                .send()
                .await?;

            match response.status() {
                // token 已失效，視同已登出
                StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND => {
                    tracing::debug!("🔑 Session already invalid on server");
                }
                _ => {
                    check_status(response).await?;
                }
            }
        }

        *self.session.write().await = None;
        self.emit(AuthChangeEvent::SignedOut, None);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

/// 補上 expires_at（部分回應只有 expires_in）
fn parse_session(mut session: Session) -> Session {
    if session.expires_at.is_none() {
        if let Some(expires_in) = session.expires_in {
            session.expires_at = Some(chrono::Utc::now().timestamp().saturating_add(expires_in));
        }
    }
    session
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(CrmError::AuthError {
        status: status.as_u16(),
        message: extract_error_message(&body, status),
    })
}

/// GoTrue 的錯誤格式不一：msg / error_description / message / error
pub(crate) fn extract_error_message(body: &str, status: StatusCode) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();

    parsed
        .as_ref()
        .and_then(|value| {
            ["msg", "error_description", "message", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        })
        .map(str::to_string)
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        })
}
