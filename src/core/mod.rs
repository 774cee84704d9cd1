pub mod auth;
pub mod embedding;

pub use crate::domain::model::{AuthEvent, AuthState, EntityKind, Session, Toast, User};
pub use crate::domain::ports::{AuthProvider, EntityEmbeddingService, Notifier};
pub use crate::utils::error::Result;
