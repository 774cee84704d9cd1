use crate::config::{is_placeholder, AuthMode, BackendConfig};
use crate::utils::error::{CrmError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// "compact" 或 "json"
    pub format: Option<String>,
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // 固定的樣式，編譯不會失敗
        Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern")
    })
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CrmError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| CrmError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 只讀環境變數
    pub fn from_env() -> Self {
        Self {
            backend: BackendConfig::from_env(),
            logging: None,
        }
    }

    /// 替換環境變數 (例如 ${SUPABASE_URL})，找不到的保留原字串
    fn substitute_env_vars(content: &str) -> String {
        env_var_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    pub fn auth_mode(&self) -> AuthMode {
        AuthMode::resolve(&self.backend)
    }

    pub fn log_format(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.format.as_deref())
    }

    pub fn validate_config(&self) -> Result<()> {
        // 開發模式下的佔位值是合法的
        if self.auth_mode().is_development() {
            return Ok(());
        }

        let url = validation::validate_required_field("backend.url", &self.backend.url)?;
        validation::validate_url("backend.url", url.trim())?;

        let key = validation::validate_required_field("backend.anon_key", &self.backend.anon_key)?;
        validation::validate_non_empty_string("backend.anon_key", key)?;

        // 未設定的 site_url 直接忽略
        if let Some(site_url) = self
            .backend
            .site_url
            .as_deref()
            .filter(|s| !is_placeholder(Some(*s)))
        {
            validation::validate_url("backend.site_url", site_url)?;
        }

        if let Some(timeout) = self.backend.timeout_seconds {
            validation::validate_range("backend.timeout_seconds", timeout, 1, 300)?;
        }

        if let Some(format) = self.log_format() {
            if !["compact", "json"].contains(&format) {
                return Err(CrmError::InvalidConfigValueError {
                    field: "logging.format".to_string(),
                    value: format.to_string(),
                    reason: "Supported formats: compact, json".to_string(),
                });
            }
        }

        Ok(())
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_basic_toml_config() {
        let toml_content = r#"
[backend]
url = "https://abcd1234.supabase.co"
anon_key = "eyJhbGciOiJIUzI1NiJ9"
site_url = "https://crm.acme.io"
timeout_seconds = 10

[logging]
format = "json"
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(
            config.backend.url.as_deref(),
            Some("https://abcd1234.supabase.co")
        );
        assert_eq!(config.log_format(), Some("json"));
        assert!(!config.auth_mode().is_development());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("CRM_BRIDGE_TEST_URL", "https://wxyz9876.supabase.co");

        let toml_content = r#"
[backend]
url = "${CRM_BRIDGE_TEST_URL}"
anon_key = "${CRM_BRIDGE_TEST_UNSET_KEY}"
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.backend.url.as_deref(),
            Some("https://wxyz9876.supabase.co")
        );
        // 未設定的變數保留原樣，因此落入開發模式
        assert_eq!(
            config.backend.anon_key.as_deref(),
            Some("${CRM_BRIDGE_TEST_UNSET_KEY}")
        );
        assert!(config.auth_mode().is_development());

        std::env::remove_var("CRM_BRIDGE_TEST_URL");
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[backend]
url = "https://abcd1234.supabase.co"
anon_key = "key"
timeout_seconds = 0
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();
        assert!(matches!(
            config.validate(),
            Err(CrmError::InvalidConfigValueError { field, .. }) if field == "backend.timeout_seconds"
        ));
    }

    #[test]
    fn test_development_config_skips_backend_validation() {
        let config = AppConfig::from_toml_str("[backend]\nurl = \"\"\n").unwrap();
        assert!(config.auth_mode().is_development());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[backend]
url = "https://file1234.supabase.co"
anon_key = "key"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = AppConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(
            config.backend.url.as_deref(),
            Some("https://file1234.supabase.co")
        );
    }
}
