mod app_config;
mod config;
pub mod metrics;
pub mod slots;
mod status;
pub mod topics_file;

use std::path::PathBuf;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use status::{PostStatus, StatusError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("failed to read topics file {path}: {source}")]
    TopicsFileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse topics file: {0}")]
    TopicsFileParse(#[from] serde_yaml::Error),
    #[error("topics file validation failed: {0}")]
    Validation(String),
}
