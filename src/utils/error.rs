use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrmError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field} ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Auth request failed ({status}): {message}")]
    AuthError { status: u16, message: String },

    #[error("Embedding request for {entity} failed ({status}): {message}")]
    EmbeddingError {
        entity: String,
        status: u16,
        message: String,
    },
}

/// 錯誤分類：設定錯誤會在啟動時處理，操作錯誤則回報給使用者
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Operational,
}

impl CrmError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CrmError::ConfigError { .. }
            | CrmError::MissingConfigError { .. }
            | CrmError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            _ => ErrorCategory::Operational,
        }
    }

    /// 給通知用的訊息（不含錯誤類型前綴）
    pub fn user_friendly_message(&self) -> String {
        match self {
            CrmError::AuthError { message, .. } => message.clone(),
            CrmError::EmbeddingError { message, .. } => message.clone(),
            CrmError::ApiError(e) if e.is_timeout() => "The request timed out".to_string(),
            CrmError::ApiError(e) if e.is_connect() => "Could not reach the server".to_string(),
            CrmError::ConfigError { message } => message.clone(),
            CrmError::MissingConfigError { field } => format!("{} is not configured", field),
            CrmError::InvalidConfigValueError { field, reason, .. } => {
                format!("{}: {}", field, reason)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CrmError>;
