//! Command handlers for the CLI. These run after `main` has connected the
//! pool and applied migrations.

use std::path::Path;

use rivalboard_core::competitors::{builtin_demo_competitors, load_seed_file, Competitor};
use rivalboard_core::csv;
use rivalboard_core::ConfigError;
use sqlx::SqlitePool;

/// Seed demo competitors from a YAML file, falling back to the built-in demo
/// set when the file does not exist. A database that already has competitors
/// is left untouched.
pub(crate) async fn run_seed(pool: &SqlitePool, path: &Path) -> anyhow::Result<()> {
    let drafts = match load_seed_file(path) {
        Ok(drafts) => drafts,
        Err(ConfigError::SeedFileRead { .. }) => {
            println!(
                "seed file {} not readable, using built-in demo competitors",
                path.display()
            );
            builtin_demo_competitors()
        }
        Err(e) => return Err(e.into()),
    };

    let seeded = rivalboard_db::seed_competitors_if_empty(pool, &drafts).await?;
    if seeded == 0 {
        println!("database already has competitors, nothing seeded");
    } else {
        println!("seeded {seeded} competitor(s)");
    }
    Ok(())
}

/// Import competitors from a CSV export. Rows without a name are skipped by
/// the parser; an import that yields nothing is an error.
pub(crate) async fn run_import_csv(pool: &SqlitePool, file: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file)?;
    let drafts = csv::parse_competitors_csv(&text);
    if drafts.is_empty() {
        anyhow::bail!("no competitor rows found in {}", file.display());
    }

    let created = rivalboard_db::insert_competitors_bulk(pool, &drafts).await?;
    println!("imported {} competitor(s) from {}", created.len(), file.display());
    Ok(())
}

/// Export all competitors as CSV, to a file or stdout.
pub(crate) async fn run_export_csv(pool: &SqlitePool, out: Option<&Path>) -> anyhow::Result<()> {
    let competitors: Vec<Competitor> = rivalboard_db::list_competitors(pool)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let text = csv::competitors_to_csv(&competitors);

    match out {
        Some(path) => {
            std::fs::write(path, &text)?;
            println!("wrote {} competitor(s) to {}", competitors.len(), path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}

/// Print a short listing of tracked competitors, newest first.
pub(crate) async fn run_list(pool: &SqlitePool, limit: usize) -> anyhow::Result<()> {
    let rows = rivalboard_db::list_competitors(pool).await?;
    let total = rows.len();

    for row in rows.into_iter().take(limit) {
        println!(
            "{:>5}  {:<10}  {:<30}  {}",
            row.id,
            row.status,
            row.name,
            row.website_url.as_deref().unwrap_or("\u{2014}")
        );
    }
    if total > limit {
        println!("... and {} more", total - limit);
    }
    Ok(())
}

/// Ping the database and print schema facts.
pub(crate) async fn run_health(pool: &SqlitePool) -> anyhow::Result<()> {
    rivalboard_db::ping(pool).await?;
    let info = rivalboard_db::schema_info(pool).await?;
    println!("database: ok");
    println!("sqlite version: {}", info.sqlite_version);
    println!("applied migrations: {}", info.applied_migrations);
    println!("tables: {}", info.tables.join(", "));
    Ok(())
}
