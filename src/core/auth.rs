use crate::adapters::SupabaseAuthClient;
use crate::config::AuthMode;
use crate::domain::model::{AuthEvent, AuthState, Session, Toast, User};
use crate::domain::ports::{AuthProvider, Notifier};
use crate::utils::error::Result;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;

pub const MOCK_USER_ID: &str = "mock-user-id";
pub const MOCK_USER_EMAIL: &str = "dev@localhost";

/// 開發模式使用的固定身分
pub fn mock_user() -> User {
    User {
        id: MOCK_USER_ID.to_string(),
        email: Some(MOCK_USER_EMAIL.to_string()),
        role: Some("authenticated".to_string()),
        aud: Some("authenticated".to_string()),
        created_at: None,
        user_metadata: serde_json::json!({}),
    }
}

pub fn mock_session() -> Session {
    Session {
        access_token: "mock-access-token".to_string(),
        refresh_token: "mock-refresh-token".to_string(),
        token_type: "bearer".to_string(),
        expires_in: None,
        expires_at: None,
        user: mock_user(),
    }
}

enum Backend {
    Development,
    Live(Arc<dyn AuthProvider>),
}

/// 目前登入狀態與登入、註冊、登出操作。
///
/// 建立後需呼叫 [`AuthContext::initialize`]，結束時呼叫 [`AuthContext::shutdown`]
/// （drop 時也會停止事件監聽）。
pub struct AuthContext {
    backend: Backend,
    mode: AuthMode,
    notifier: Arc<dyn Notifier>,
    state: Arc<RwLock<AuthState>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl AuthContext {
    /// 依 `mode` 建立。
    ///
    /// 開發模式下 `provider` 會直接被丟棄，從不呼叫，也不訂閱它的事件；
    /// 開發模式請改用 [`AuthContext::development`]。
    pub fn new(mode: AuthMode, provider: Arc<dyn AuthProvider>, notifier: Arc<dyn Notifier>) -> Self {
        let backend = if mode.is_development() {
            Backend::Development
        } else {
            Backend::Live(provider)
        };

        Self {
            backend,
            mode,
            notifier,
            state: Arc::new(RwLock::new(AuthState {
                user: None,
                session: None,
                loading: true,
            })),
            listener: Mutex::new(None),
        }
    }

    pub fn development(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            backend: Backend::Development,
            mode: AuthMode::Development,
            notifier,
            state: Arc::new(RwLock::new(AuthState {
                user: None,
                session: None,
                loading: true,
            })),
            listener: Mutex::new(None),
        }
    }

    /// 依模式建立；正式模式使用 GoTrue REST 客戶端
    pub fn connect(mode: AuthMode, notifier: Arc<dyn Notifier>) -> Result<Self> {
        match &mode {
            AuthMode::Development => Ok(Self::development(notifier)),
            AuthMode::Live(backend) => {
                let provider = Arc::new(SupabaseAuthClient::new(backend)?);
                Ok(Self::new(mode, provider, notifier))
            }
        }
    }

    pub fn mode(&self) -> &AuthMode {
        &self.mode
    }

    pub fn is_development(&self) -> bool {
        matches!(self.backend, Backend::Development)
    }

    pub async fn snapshot(&self) -> AuthState {
        self.state.read().await.clone()
    }

    pub async fn user(&self) -> Option<User> {
        self.state.read().await.user.clone()
    }

    pub async fn session(&self) -> Option<Session> {
        self.state.read().await.session.clone()
    }

    pub async fn loading(&self) -> bool {
        self.state.read().await.loading
    }

    pub async fn initialize(&self) {
        let provider = match &self.backend {
            Backend::Development => {
                tracing::info!("🧪 Development mode: using mock user and session");
                let mut state = self.state.write().await;
                state.session = Some(mock_session());
                state.user = Some(mock_user());
                state.loading = false;
                return;
            }
            Backend::Live(provider) => provider.clone(),
        };

        match provider.get_session().await {
            Ok(session) => {
                tracing::debug!("🔑 Initial session present: {}", session.is_some());
                let mut state = self.state.write().await;
                state.user = session.as_ref().map(|s| s.user.clone());
                state.session = session;
                state.loading = false;
            }
            Err(e) => {
                tracing::error!("❌ Failed to load initial session: {}", e);
                self.state.write().await.loading = false;
                self.notifier.notify(Toast::destructive(
                    "Error loading session",
                    e.user_friendly_message(),
                ));
            }
        }

        let receiver = provider.subscribe();
        let handle = tokio::spawn(listen_for_auth_events(receiver, self.state.clone()));

        let mut listener = self.listener.lock().await;
        if let Some(previous) = listener.replace(handle) {
            previous.abort();
        }
    }

    /// 停止事件監聽；返回後狀態不再變動
    pub async fn shutdown(&self) {
        let handle = self.listener.lock().await.take();
        if let Some(handle) = handle {
            handle.abort();
            // 取消後的 JoinError 是預期結果
            let _ = handle.await;
            tracing::debug!("🔌 Auth listener stopped");
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<()> {
        let provider = match &self.backend {
            Backend::Development => {
                tracing::info!("🧪 Mock sign in for {}", email);
                self.notifier
                    .notify(Toast::info("Development Mode", "Mock sign in successful"));
                return Ok(());
            }
            Backend::Live(provider) => provider.clone(),
        };

        self.set_loading(true).await;
        let result = provider.sign_in_with_password(email, password).await;
        self.set_loading(false).await;

        match result {
            Ok(_) => {
                tracing::info!("✅ Signed in as {}", email);
                self.notifier.notify(Toast::info(
                    "Welcome back!",
                    "You have successfully signed in.",
                ));
                Ok(())
            }
            Err(e) => {
                tracing::error!("❌ Sign in failed: {}", e);
                self.notifier
                    .notify(Toast::destructive("Error signing in", e.user_friendly_message()));
                Err(e)
            }
        }
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<()> {
        let (provider, redirect_to) = match (&self.backend, &self.mode) {
            (Backend::Live(provider), AuthMode::Live(live)) => {
                (provider.clone(), live.site_url.clone())
            }
            _ => {
                tracing::info!("🧪 Mock sign up for {}", email);
                self.notifier
                    .notify(Toast::info("Development Mode", "Mock sign up successful"));
                return Ok(());
            }
        };

        self.set_loading(true).await;
        let result = provider
            .sign_up(email, password, redirect_to.as_deref())
            .await;
        self.set_loading(false).await;

        match result {
            Ok(outcome) => {
                tracing::info!(
                    "✅ Signed up {} (confirmation pending: {})",
                    email,
                    outcome.session.is_none()
                );
                self.notifier.notify(Toast::info(
                    "Account created!",
                    "Please check your email to verify your account.",
                ));
                Ok(())
            }
            Err(e) => {
                tracing::error!("❌ Sign up failed: {}", e);
                self.notifier
                    .notify(Toast::destructive("Error signing up", e.user_friendly_message()));
                Err(e)
            }
        }
    }

    /// 失敗只會通知，不回傳給呼叫端
    pub async fn sign_out(&self) {
        let provider = match &self.backend {
            Backend::Development => {
                tracing::info!("🧪 Mock sign out");
                self.notifier
                    .notify(Toast::info("Development Mode", "Mock sign out successful"));
                return;
            }
            Backend::Live(provider) => provider.clone(),
        };

        self.set_loading(true).await;
        let result = provider.sign_out().await;
        self.set_loading(false).await;

        match result {
            Ok(()) => {
                tracing::info!("👋 Signed out");
                self.notifier.notify(Toast::info(
                    "Signed out",
                    "You have been signed out successfully.",
                ));
            }
            Err(e) => {
                tracing::error!("❌ Sign out failed: {}", e);
                self.notifier
                    .notify(Toast::destructive("Error signing out", e.user_friendly_message()));
            }
        }
    }

    async fn set_loading(&self, loading: bool) {
        self.state.write().await.loading = loading;
    }
}

impl Drop for AuthContext {
    fn drop(&mut self) {
        if let Some(handle) = self.listener.get_mut().take() {
            handle.abort();
        }
    }
}

async fn listen_for_auth_events(
    mut receiver: broadcast::Receiver<AuthEvent>,
    state: Arc<RwLock<AuthState>>,
) {
    loop {
        match receiver.recv().await {
            Ok(event) => {
                tracing::debug!("🔔 Auth event: {:?}", event.kind);
                let mut state = state.write().await;
                state.user = event.session.as_ref().map(|s| s.user.clone());
                state.session = event.session;
                state.loading = false;
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("⚠️ Auth listener lagged, skipped {} events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => {
                tracing::debug!("🔌 Auth event stream closed");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ToastVariant;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct RecordingNotifier {
        toasts: StdMutex<Vec<Toast>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, toast: Toast) {
            self.toasts.lock().unwrap().push(toast);
        }
    }

    #[tokio::test]
    async fn test_development_context_sets_mock_identity() {
        let notifier = Arc::new(RecordingNotifier::default());
        let context = AuthContext::development(notifier.clone());
        assert!(context.loading().await);

        context.initialize().await;

        let state = context.snapshot().await;
        assert!(!state.loading);
        assert_eq!(state.user, Some(mock_user()));
        assert_eq!(state.session, Some(mock_session()));
        assert!(notifier.toasts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_development_sign_out_keeps_mock_session() {
        let notifier = Arc::new(RecordingNotifier::default());
        let context = AuthContext::development(notifier.clone());
        context.initialize().await;

        context.sign_out().await;

        assert_eq!(context.session().await, Some(mock_session()));
        let toasts = notifier.toasts.lock().unwrap();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].variant, ToastVariant::Default);
        assert_eq!(toasts[0].title, "Development Mode");
    }
}
