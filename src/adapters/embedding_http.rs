use crate::adapters::supabase::extract_error_message;
use crate::config::LiveBackend;
use crate::domain::model::EntityKind;
use crate::domain::ports::EntityEmbeddingService;
use crate::utils::error::{CrmError, Result};
use async_trait::async_trait;
use reqwest::Client;

/// 呼叫 `<entity>-embeddings` edge function 的 embedding 服務
#[derive(Debug, Clone)]
pub struct HttpEmbeddingService {
    kind: EntityKind,
    client: Client,
    endpoint: String,
    api_key: String,
    access_token: Option<String>,
}

impl HttpEmbeddingService {
    pub fn new(kind: EntityKind, backend: &LiveBackend) -> Result<Self> {
        let client = Client::builder().timeout(backend.timeout).build()?;
        Ok(Self::with_client(kind, client, backend))
    }

    pub fn with_client(kind: EntityKind, client: Client, backend: &LiveBackend) -> Self {
        Self {
            kind,
            client,
            endpoint: format!("{}/{}", backend.functions_base(), kind.function_name()),
            api_key: backend.anon_key.clone(),
            access_token: None,
        }
    }

    /// 以使用者身分呼叫（預設用 anon key）
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn invoke(&self, action: &str, id_field: &str, id: &str) -> Result<serde_json::Value> {
        let mut body = serde_json::Map::new();
        body.insert("action".to_string(), serde_json::Value::from(action));
        body.insert(id_field.to_string(), serde_json::Value::from(id));

        tracing::debug!("📡 POST {} action={}", self.endpoint, action);
        let bearer = self.access_token.as_deref().unwrap_or(&self.api_key);
        let response = self
            .client
            .post(&self.endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(bearer)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("📡 Embedding response status: {}", status);

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CrmError::EmbeddingError {
                entity: self.kind.label().to_string(),
                status: status.as_u16(),
                message: extract_error_message(&text, status),
            });
        }

        // 204 或空 body 視為 null
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl EntityEmbeddingService for HttpEmbeddingService {
    type Output = serde_json::Value;
    type Error = CrmError;

    async fn update_embedding(&self, id: &str) -> Result<serde_json::Value> {
        self.invoke("update_embedding", self.kind.id_field(), id).await
    }

    async fn handle_created(&self, id: &str) -> Result<serde_json::Value> {
        self.invoke("created", self.kind.id_field(), id).await
    }

    async fn handle_updated(&self, id: &str) -> Result<serde_json::Value> {
        self.invoke("updated", self.kind.id_field(), id).await
    }

    async fn handle_activity_changed(&self, activity_id: &str) -> Result<serde_json::Value> {
        self.invoke("activity_changed", "activityId", activity_id)
            .await
    }
}
