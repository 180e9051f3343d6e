mod api;
mod middleware;
mod workflow;

use std::sync::Arc;

use rivalboard_core::competitors::{builtin_demo_competitors, load_seed_file};
use rivalboard_core::store::DashboardState;
use rivalboard_core::ConfigError;
use tokio::sync::RwLock;
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};
use crate::workflow::WorkflowClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = rivalboard_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = rivalboard_db::PoolConfig::from_app_config(&config);
    let pool = rivalboard_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = rivalboard_db::run_migrations(&pool).await?;
    if applied > 0 {
        tracing::info!(applied, "applied database migrations");
    }

    // Missing seed file falls back to the built-in demo set; a present but
    // broken one is a configuration error and fails startup.
    let drafts = match load_seed_file(&config.seed_path) {
        Ok(drafts) => drafts,
        Err(ConfigError::SeedFileRead { .. }) => {
            tracing::debug!(
                path = %config.seed_path.display(),
                "seed file not readable, using built-in demo competitors"
            );
            builtin_demo_competitors()
        }
        Err(e) => return Err(e.into()),
    };
    let seeded = rivalboard_db::seed_competitors_if_empty(&pool, &drafts).await?;
    if seeded > 0 {
        tracing::info!(seeded, "seeded demo competitors into the empty database");
    }

    let competitors = rivalboard_db::list_competitors(&pool)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let store = Arc::new(RwLock::new(DashboardState::seeded(competitors)));

    let workflow = match config.content_webhook_url.as_deref() {
        Some(url) => Some(Arc::new(WorkflowClient::new(
            url,
            config.webhook_timeout_secs,
        )?)),
        None => {
            tracing::warn!(
                "RIVALBOARD_CONTENT_WEBHOOK_URL not set; the content workflow endpoint will answer 503"
            );
            None
        }
    };

    let app = build_app(AppState {
        pool,
        store,
        data_dir: config.data_dir.clone(),
        public_base_url: config.public_base_url.clone(),
        workflow,
    });

    tracing::info!(addr = %config.bind_addr, env = %config.env, "rivalboard server listening");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
