use rivalboard_core::competitors::CompetitorDraft;
use sqlx::SqlitePool;

use crate::{count_competitors, insert_competitors_bulk, DbError};

/// Seed demo competitors into an empty database.
///
/// Returns the number of rows inserted; a database that already holds any
/// competitor is left untouched and reports zero. Safe to call on every
/// startup.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_competitors_if_empty(
    pool: &SqlitePool,
    drafts: &[CompetitorDraft],
) -> Result<usize, DbError> {
    if count_competitors(pool).await? > 0 {
        return Ok(0);
    }
    let created = insert_competitors_bulk(pool, drafts).await?;
    Ok(created.len())
}
