#![allow(dead_code)]

use async_trait::async_trait;
use crm_bridge::config::LiveBackend;
use crm_bridge::domain::model::{
    AuthChangeEvent, AuthEvent, Session, SignUpOutcome, Toast, User,
};
use crm_bridge::domain::ports::{AuthProvider, Notifier};
use crm_bridge::{AuthMode, CrmError, Result};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

pub fn live_mode(url: &str) -> AuthMode {
    AuthMode::Live(live_backend(url))
}

pub fn live_backend(url: &str) -> LiveBackend {
    LiveBackend {
        url: url.trim_end_matches('/').to_string(),
        anon_key: "test-anon-key".to_string(),
        site_url: Some("http://localhost:3000".to_string()),
        timeout: Duration::from_secs(5),
        functions_path: "/functions/v1".to_string(),
    }
}

pub fn session_for(email: &str, access_token: &str) -> Session {
    Session {
        access_token: access_token.to_string(),
        refresh_token: format!("{}-refresh", access_token),
        token_type: "bearer".to_string(),
        expires_in: Some(3600),
        expires_at: None,
        user: User {
            id: format!("id-{}", email),
            email: Some(email.to_string()),
            role: Some("authenticated".to_string()),
            aud: Some("authenticated".to_string()),
            created_at: None,
            user_metadata: serde_json::json!({}),
        },
    }
}

/// 記錄所有通知
#[derive(Default)]
pub struct RecordingNotifier {
    toasts: Mutex<Vec<Toast>>,
}

impl RecordingNotifier {
    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().unwrap().clone()
    }

    pub fn destructive_count(&self) -> usize {
        self.toasts().iter().filter(|t| t.is_destructive()).count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, toast: Toast) {
        self.toasts.lock().unwrap().push(toast);
    }
}

/// 可設定失敗的假 AuthProvider，並記錄每次呼叫
pub struct MockAuthProvider {
    pub events: broadcast::Sender<AuthEvent>,
    calls: Mutex<Vec<String>>,
    initial_session: Mutex<Option<Session>>,
    session_error: Mutex<Option<String>>,
    sign_in_error: Mutex<Option<String>>,
    sign_up_error: Mutex<Option<String>>,
    sign_out_error: Mutex<Option<String>>,
    last_redirect: Mutex<Option<String>>,
}

impl MockAuthProvider {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            events,
            calls: Mutex::new(Vec::new()),
            initial_session: Mutex::new(None),
            session_error: Mutex::new(None),
            sign_in_error: Mutex::new(None),
            sign_up_error: Mutex::new(None),
            sign_out_error: Mutex::new(None),
            last_redirect: Mutex::new(None),
        }
    }

    pub fn with_initial_session(self, session: Session) -> Self {
        *self.initial_session.lock().unwrap() = Some(session);
        self
    }

    pub fn failing_get_session(self, message: &str) -> Self {
        *self.session_error.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn failing_sign_in(self, message: &str) -> Self {
        *self.sign_in_error.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn failing_sign_up(self, message: &str) -> Self {
        *self.sign_up_error.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn failing_sign_out(self, message: &str) -> Self {
        *self.sign_out_error.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_redirect(&self) -> Option<String> {
        self.last_redirect.lock().unwrap().clone()
    }

    pub fn emit(&self, kind: AuthChangeEvent, session: Option<Session>) {
        let _ = self.events.send(AuthEvent::new(kind, session));
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    fn error_from(slot: &Mutex<Option<String>>, status: u16) -> Option<CrmError> {
        slot.lock().unwrap().clone().map(|message| CrmError::AuthError { status, message })
    }
}

#[async_trait]
impl AuthProvider for MockAuthProvider {
    async fn get_session(&self) -> Result<Option<Session>> {
        self.record("get_session");
        if let Some(e) = Self::error_from(&self.session_error, 500) {
            return Err(e);
        }
        Ok(self.initial_session.lock().unwrap().clone())
    }

    async fn sign_in_with_password(&self, email: &str, _password: &str) -> Result<Session> {
        self.record("sign_in_with_password");
        if let Some(e) = Self::error_from(&self.sign_in_error, 400) {
            return Err(e);
        }
        let session = session_for(email, "signed-in-token");
        self.emit(AuthChangeEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        _password: &str,
        redirect_to: Option<&str>,
    ) -> Result<SignUpOutcome> {
        self.record("sign_up");
        *self.last_redirect.lock().unwrap() = redirect_to.map(String::from);
        if let Some(e) = Self::error_from(&self.sign_up_error, 422) {
            return Err(e);
        }
        Ok(SignUpOutcome {
            user: Some(session_for(email, "unused").user),
            session: None,
        })
    }

    async fn sign_out(&self) -> Result<()> {
        self.record("sign_out");
        if let Some(e) = Self::error_from(&self.sign_out_error, 503) {
            return Err(e);
        }
        self.emit(AuthChangeEvent::SignedOut, None);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.record("subscribe");
        self.events.subscribe()
    }
}

/// 輪詢直到條件成立（最多約一秒）
pub async fn wait_until<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// 收集本 crate 發出的 tracing 事件
#[derive(Clone, Default)]
pub struct LogCapture {
    events: Arc<Mutex<Vec<(tracing::Level, String)>>>,
}

struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{:?}", value);
        }
    }
}

impl<S: tracing::Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        if !event.metadata().target().starts_with("crm_bridge") {
            return;
        }
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.events
            .lock()
            .unwrap()
            .push((*event.metadata().level(), visitor.0));
    }
}

impl LogCapture {
    /// 只對目前執行緒生效，配合 current-thread 的 tokio::test 使用
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::registry().with(self.clone());
        tracing::subscriber::set_default(subscriber)
    }

    pub fn messages(&self, level: tracing::Level) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn count(&self, level: tracing::Level) -> usize {
        self.messages(level).len()
    }
}
