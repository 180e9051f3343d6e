//! Database operations for the `competitors` table.

use chrono::{DateTime, Utc};
use rivalboard_core::competitors::{Competitor, CompetitorDraft, CompetitorPatch, CompetitorStatus};
use sqlx::SqlitePool;

use crate::DbError;

const COMPETITOR_COLUMNS: &str = "id, name, website_url, twitter_url, instagram_url, \
     facebook_url, reddit_url, discord_url, industry, description, logo_url, status, \
     created_at, updated_at";

/// A row from the `competitors` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CompetitorRow {
    pub id: i64,
    pub name: String,
    pub website_url: Option<String>,
    pub twitter_url: Option<String>,
    pub instagram_url: Option<String>,
    pub facebook_url: Option<String>,
    pub reddit_url: Option<String>,
    pub discord_url: Option<String>,
    pub industry: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CompetitorRow> for Competitor {
    fn from(row: CompetitorRow) -> Self {
        Competitor {
            id: row.id,
            name: row.name,
            website_url: row.website_url,
            twitter_url: row.twitter_url,
            instagram_url: row.instagram_url,
            facebook_url: row.facebook_url,
            reddit_url: row.reddit_url,
            discord_url: row.discord_url,
            industry: row.industry,
            description: row.description,
            logo_url: row.logo_url,
            status: CompetitorStatus::parse_lenient(&row.status),
        }
    }
}

/// Returns all competitors, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_competitors(pool: &SqlitePool) -> Result<Vec<CompetitorRow>, DbError> {
    let rows = sqlx::query_as::<_, CompetitorRow>(&format!(
        "SELECT {COMPETITOR_COLUMNS} FROM competitors ORDER BY id DESC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Returns a single competitor by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_competitor(pool: &SqlitePool, id: i64) -> Result<Option<CompetitorRow>, DbError> {
    let row = sqlx::query_as::<_, CompetitorRow>(&format!(
        "SELECT {COMPETITOR_COLUMNS} FROM competitors WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Inserts a competitor and returns the full inserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn insert_competitor(
    pool: &SqlitePool,
    draft: &CompetitorDraft,
) -> Result<CompetitorRow, DbError> {
    let row = sqlx::query_as::<_, CompetitorRow>(&format!(
        "INSERT INTO competitors \
           (name, website_url, twitter_url, instagram_url, facebook_url, reddit_url, \
            discord_url, industry, description, logo_url, status) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11) \
         RETURNING {COMPETITOR_COLUMNS}"
    ))
    .bind(draft.name.trim())
    .bind(&draft.website_url)
    .bind(&draft.twitter_url)
    .bind(&draft.instagram_url)
    .bind(&draft.facebook_url)
    .bind(&draft.reddit_url)
    .bind(&draft.discord_url)
    .bind(&draft.industry)
    .bind(&draft.description)
    .bind(&draft.logo_url)
    .bind(draft.status.as_str())
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Inserts a batch of competitors inside one transaction and returns the
/// inserted rows in input order. Rolls back the whole batch on any failure.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails.
pub async fn insert_competitors_bulk(
    pool: &SqlitePool,
    drafts: &[CompetitorDraft],
) -> Result<Vec<CompetitorRow>, DbError> {
    let mut tx = pool.begin().await?;
    let mut created = Vec::with_capacity(drafts.len());

    for draft in drafts {
        let row = sqlx::query_as::<_, CompetitorRow>(&format!(
            "INSERT INTO competitors \
               (name, website_url, twitter_url, instagram_url, facebook_url, reddit_url, \
                discord_url, industry, description, logo_url, status) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11) \
             RETURNING {COMPETITOR_COLUMNS}"
        ))
        .bind(draft.name.trim())
        .bind(&draft.website_url)
        .bind(&draft.twitter_url)
        .bind(&draft.instagram_url)
        .bind(&draft.facebook_url)
        .bind(&draft.reddit_url)
        .bind(&draft.discord_url)
        .bind(&draft.industry)
        .bind(&draft.description)
        .bind(&draft.logo_url)
        .bind(draft.status.as_str())
        .fetch_one(&mut *tx)
        .await?;
        created.push(row);
    }

    tx.commit().await?;
    Ok(created)
}

/// Applies a sparse patch to an existing competitor and returns the updated
/// row, or `None` if the id does not exist.
///
/// Read-modify-write: the patch is overlaid in Rust (so "explicitly cleared"
/// and "not in request" stay distinct) and the full row is written back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any query fails.
pub async fn update_competitor(
    pool: &SqlitePool,
    id: i64,
    patch: &CompetitorPatch,
) -> Result<Option<CompetitorRow>, DbError> {
    let Some(row) = get_competitor(pool, id).await? else {
        return Ok(None);
    };

    let mut competitor = Competitor::from(row);
    patch.apply_to(&mut competitor);

    sqlx::query(
        "UPDATE competitors SET \
            name = ?1, website_url = ?2, twitter_url = ?3, instagram_url = ?4, \
            facebook_url = ?5, reddit_url = ?6, discord_url = ?7, industry = ?8, \
            description = ?9, logo_url = ?10, status = ?11 \
         WHERE id = ?12",
    )
    .bind(competitor.name.trim())
    .bind(&competitor.website_url)
    .bind(&competitor.twitter_url)
    .bind(&competitor.instagram_url)
    .bind(&competitor.facebook_url)
    .bind(&competitor.reddit_url)
    .bind(&competitor.discord_url)
    .bind(&competitor.industry)
    .bind(&competitor.description)
    .bind(&competitor.logo_url)
    .bind(competitor.status.as_str())
    .bind(id)
    .execute(pool)
    .await?;

    // Re-read so `updated_at` reflects the AFTER UPDATE trigger.
    get_competitor(pool, id).await
}

/// Deletes a competitor. Returns `true` when a row was removed. Linked
/// analysis rows and news mentions cascade away with it.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn delete_competitor(pool: &SqlitePool, id: i64) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM competitors WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Total number of competitor rows.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_competitors(pool: &SqlitePool) -> Result<i64, DbError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM competitors")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
