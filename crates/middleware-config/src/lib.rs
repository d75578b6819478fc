//! Layered configuration: a YAML tree overlaid, leaf by leaf, with
//! environment variables and container secret files.
//!
//! An overlay key for the leaf at `api_client.api_url` under prefix
//! `SQL_TO_ARC` is `SQL_TO_ARC_API_CLIENT_API_URL` in the environment, or
//! the file `/run/secrets/sql_to_arc_api_client_api_url`. Environment wins
//! over secret file wins over the YAML value.

mod settings;
mod wrapper;

pub use settings::{
    ApiClientConfig, HarvestConfig, LogLevel, OtelConfig, Secret, SqlConfig,
    DEFAULT_HARVEST_BATCH_SIZE,
};
pub use wrapper::ConfigWrapper;

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file {path:?} not found")]
    NotFound { path: PathBuf },

    #[error("failed to read config file {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
