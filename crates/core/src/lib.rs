pub mod config;

pub use config::{BackendConfig, Config, EvaluatorConfig, ServerConfig};
