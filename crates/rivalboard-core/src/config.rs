use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if any env var holds an unparsable value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if any env var holds an unparsable value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    // A local SQLite file is the default store; no env var is strictly required.
    let database_url = or_default("DATABASE_URL", "sqlite://./.data/rivalboard.sqlite");

    let env = parse_environment(&or_default("RIVALBOARD_ENV", "development"));

    let bind_addr = parse_addr("RIVALBOARD_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("RIVALBOARD_LOG_LEVEL", "info");
    let public_base_url = or_default("RIVALBOARD_PUBLIC_BASE_URL", "http://localhost:3000")
        .trim_end_matches('/')
        .to_string();
    let data_dir = PathBuf::from(or_default("RIVALBOARD_DATA_DIR", "./.data"));
    let seed_path = PathBuf::from(or_default(
        "RIVALBOARD_SEED_PATH",
        "./config/competitors.yaml",
    ));
    let content_webhook_url = lookup("RIVALBOARD_CONTENT_WEBHOOK_URL")
        .ok()
        .filter(|v| !v.trim().is_empty());
    let webhook_timeout_secs = parse_u64("RIVALBOARD_WEBHOOK_TIMEOUT_SECS", "30")?;

    let db_max_connections = parse_u32("RIVALBOARD_DB_MAX_CONNECTIONS", "5")?;
    let db_min_connections = parse_u32("RIVALBOARD_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("RIVALBOARD_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        public_base_url,
        data_dir,
        seed_path,
        content_webhook_url,
        webhook_timeout_secs,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
