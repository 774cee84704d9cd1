pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{ChannelNotifier, ConsoleNotifier, HttpEmbeddingService, SupabaseAuthClient};
pub use config::{AppConfig, AuthMode, BackendConfig, LiveBackend};
pub use core::{auth::AuthContext, embedding::EmbeddingHooks};
pub use utils::error::{CrmError, Result};
