#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::{AppConfig, LoggingConfig};

/// 範本檔裡常見的佔位字串（比對時不分大小寫）
pub const PLACEHOLDER_MARKERS: &[&str] = &[
    "your-project-ref",
    "your-project",
    "your-anon-key",
    "placeholder",
    "example",
];

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_FUNCTIONS_PATH: &str = "/functions/v1";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendConfig {
    pub url: Option<String>,
    pub anon_key: Option<String>,
    /// 註冊信件的導回網址
    pub site_url: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub functions_path: Option<String>,
}

impl BackendConfig {
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("SUPABASE_URL").ok(),
            anon_key: std::env::var("SUPABASE_ANON_KEY").ok(),
            site_url: std::env::var("SUPABASE_SITE_URL").ok(),
            timeout_seconds: None,
            functions_path: None,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS))
    }
}

/// 判斷設定值是否未設定或仍是範本內容
pub fn is_placeholder(value: Option<&str>) -> bool {
    let value = match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => return true,
    };

    // 沒被替換掉的 ${VAR}
    if value.contains("${") {
        return true;
    }

    let lowered = value.to_ascii_lowercase();
    PLACEHOLDER_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiveBackend {
    pub url: String,
    pub anon_key: String,
    pub site_url: Option<String>,
    pub timeout: Duration,
    pub functions_path: String,
}

impl LiveBackend {
    pub fn auth_base(&self) -> String {
        format!("{}/auth/v1", self.url.trim_end_matches('/'))
    }

    pub fn functions_base(&self) -> String {
        format!(
            "{}/{}",
            self.url.trim_end_matches('/'),
            self.functions_path.trim_matches('/')
        )
    }
}

/// 啟動時決定一次的運作模式
#[derive(Debug, Clone, PartialEq)]
pub enum AuthMode {
    Development,
    Live(LiveBackend),
}

impl AuthMode {
    pub fn resolve(config: &BackendConfig) -> Self {
        let url = config.url.as_deref();
        let key = config.anon_key.as_deref();

        if is_placeholder(url) || is_placeholder(key) {
            tracing::warn!("🧪 Backend configuration missing or placeholder, using development mode");
            return AuthMode::Development;
        }

        // 上面已確認兩者皆存在
        let (Some(url), Some(anon_key)) = (url, key) else {
            return AuthMode::Development;
        };

        AuthMode::Live(LiveBackend {
            url: url.trim().trim_end_matches('/').to_string(),
            anon_key: anon_key.trim().to_string(),
            site_url: config
                .site_url
                .clone()
                .filter(|s| !is_placeholder(Some(s.as_str()))),
            timeout: config.timeout(),
            functions_path: config
                .functions_path
                .clone()
                .unwrap_or_else(|| DEFAULT_FUNCTIONS_PATH.to_string()),
        })
    }

    pub fn is_development(&self) -> bool {
        matches!(self, AuthMode::Development)
    }

    pub fn live(&self) -> Option<&LiveBackend> {
        match self {
            AuthMode::Live(backend) => Some(backend),
            AuthMode::Development => None,
        }
    }
}
