pub mod config;
pub mod handlers;
pub mod observability;
pub mod server;

pub use config::{ApiConfig, AppConfig, LoggingConfig, ServerConfig};
pub use observability::{apply_logging_level, init_tracing};
pub use server::{AppState, ContractMount, ServerBuilder, WdrServer, build_app, build_state};
