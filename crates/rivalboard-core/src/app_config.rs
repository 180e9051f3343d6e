use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Base URL the service is reachable at; used to build `view_url` links
    /// returned to the external content workflow.
    pub public_base_url: String,
    /// Root directory for file-backed stores (analysis results, social content).
    pub data_dir: PathBuf,
    /// Optional YAML file with demo competitors to seed an empty database.
    pub seed_path: PathBuf,
    /// External content-generation webhook. Unset disables the proxy route.
    pub content_webhook_url: Option<String>,
    pub webhook_timeout_secs: u64,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("public_base_url", &self.public_base_url)
            .field("data_dir", &self.data_dir)
            .field("seed_path", &self.seed_path)
            .field("database_url", &"[redacted]")
            .field(
                "content_webhook_url",
                &self.content_webhook_url.as_ref().map(|_| "[redacted]"),
            )
            .field("webhook_timeout_secs", &self.webhook_timeout_secs)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
