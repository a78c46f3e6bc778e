//! Error type for file loading.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("unexpected shape in {path}: {message}")]
    Shape { path: PathBuf, message: String },

    #[error("duplicate rule_id '{0}'")]
    Duplicate(String),
}

pub type Result<T> = std::result::Result<T, LoadError>;
