//! HTTP service that proxies text-to-speech requests to a cloud provider
//! and keeps every synthesized clip as an MP3 file on local disk.

pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod validation;

pub use cache::{sanitize_key, AudioCache, CacheKey};
pub use config::ServerConfig;
pub use error::ApiError;
pub use handlers::AppState;
pub use routes::build_router;
