//! Domain types and pure logic for the rivalboard competitor dashboard:
//! configuration, competitor records, CSV parsing, the deterministic mock
//! analysis engine, and the reducer-style dashboard state store.

pub mod analysis;
pub mod app_config;
pub mod competitors;
mod config;
pub mod csv;
pub mod store;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read seed file {path}: {source}")]
    SeedFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse seed file {path}: {source}")]
    SeedFileParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("seed file {path} is invalid: {reason}")]
    SeedFileInvalid { path: String, reason: String },
}
