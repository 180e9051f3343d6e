mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "rivalboard-cli")]
#[command(about = "Rivalboard command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run pending database migrations
    Migrate,
    /// Seed demo competitors into an empty database
    Seed {
        /// YAML seed file (defaults to the configured seed path)
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Import competitors from a CSV file
    ImportCsv {
        /// CSV file to import
        file: PathBuf,
    },
    /// Export all competitors as CSV
    ExportCsv {
        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List tracked competitors
    List {
        /// Maximum number of rows to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Check database connectivity and schema state
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = rivalboard_core::load_app_config()?;
    let pool = rivalboard_db::connect_pool(
        &config.database_url,
        rivalboard_db::PoolConfig::from_app_config(&config),
    )
    .await?;
    let applied = rivalboard_db::run_migrations(&pool).await?;

    match cli.command {
        Commands::Migrate => {
            println!("applied {applied} migration(s)");
        }
        Commands::Seed { file } => {
            let path = file.unwrap_or_else(|| config.seed_path.clone());
            commands::run_seed(&pool, &path).await?;
        }
        Commands::ImportCsv { file } => {
            commands::run_import_csv(&pool, &file).await?;
        }
        Commands::ExportCsv { out } => {
            commands::run_export_csv(&pool, out.as_deref()).await?;
        }
        Commands::List { limit } => {
            commands::run_list(&pool, limit).await?;
        }
        Commands::Health => {
            commands::run_health(&pool).await?;
        }
    }

    Ok(())
}
