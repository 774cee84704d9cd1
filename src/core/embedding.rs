use crate::domain::model::EntityKind;
use crate::domain::ports::EntityEmbeddingService;
use std::future::Future;

/// 單一實體的 embedding 觸發器：記錄日誌後直接轉呼叫服務，結果與錯誤原樣回傳。
///
/// 沒有重試、批次或快取。
pub struct EmbeddingHooks<S: EntityEmbeddingService> {
    kind: EntityKind,
    service: S,
}

impl<S: EntityEmbeddingService> EmbeddingHooks<S> {
    pub fn new(kind: EntityKind, service: S) -> Self {
        Self { kind, service }
    }

    pub fn contacts(service: S) -> Self {
        Self::new(EntityKind::Contact, service)
    }

    pub fn deals(service: S) -> Self {
        Self::new(EntityKind::Deal, service)
    }

    pub fn leads(service: S) -> Self {
        Self::new(EntityKind::Lead, service)
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub async fn update_embedding(&self, id: &str) -> Result<S::Output, S::Error> {
        self.forward(
            "update embedding",
            self.kind.id_field(),
            id,
            self.service.update_embedding(id),
        )
        .await
    }

    pub async fn handle_created(&self, id: &str) -> Result<S::Output, S::Error> {
        self.forward(
            "handle created",
            self.kind.id_field(),
            id,
            self.service.handle_created(id),
        )
        .await
    }

    pub async fn handle_updated(&self, id: &str) -> Result<S::Output, S::Error> {
        self.forward(
            "handle updated",
            self.kind.id_field(),
            id,
            self.service.handle_updated(id),
        )
        .await
    }

    pub async fn handle_activity_changed(&self, activity_id: &str) -> Result<S::Output, S::Error> {
        self.forward(
            "handle activity changed",
            "activityId",
            activity_id,
            self.service.handle_activity_changed(activity_id),
        )
        .await
    }

    async fn forward<F>(
        &self,
        action: &str,
        id_field: &str,
        id: &str,
        call: F,
    ) -> Result<S::Output, S::Error>
    where
        F: Future<Output = Result<S::Output, S::Error>>,
    {
        tracing::info!("🧠 {}: {} ({}={})", self.kind, action, id_field, id);

        match call.await {
            Ok(output) => {
                tracing::info!("✅ {}: {} done ({}={})", self.kind, action, id_field, id);
                Ok(output)
            }
            Err(e) => {
                tracing::error!(
                    "❌ {}: {} failed ({}={}): {}",
                    self.kind,
                    action,
                    id_field,
                    id,
                    e
                );
                Err(e)
            }
        }
    }
}
