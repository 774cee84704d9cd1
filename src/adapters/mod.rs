// Adapters layer: concrete implementations of the domain ports for external systems.

pub mod embedding_http;
pub mod notifier;
pub mod supabase;

pub use embedding_http::HttpEmbeddingService;
pub use notifier::{ChannelNotifier, ConsoleNotifier, TracingNotifier};
pub use supabase::SupabaseAuthClient;
