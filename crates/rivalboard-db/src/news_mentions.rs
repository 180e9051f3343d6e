//! Database operations for the `news_mentions` table.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::DbError;

/// A row from the `news_mentions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NewsMentionRow {
    pub id: i64,
    pub competitor_id: i64,
    pub analysis_run_id: i64,
    pub title: String,
    pub url: Option<String>,
    pub source: Option<String>,
    pub published_date: Option<String>,
    pub content: Option<String>,
    pub sentiment_score: Option<f64>,
    pub extracted_at: DateTime<Utc>,
}

/// Fields for a new mention; everything beyond the title is optional.
#[derive(Debug, Clone, Default)]
pub struct NewNewsMention {
    pub url: Option<String>,
    pub source: Option<String>,
    pub published_date: Option<String>,
    pub content: Option<String>,
    pub sentiment_score: Option<f64>,
}

/// Inserts a news mention and returns the inserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails (including when either
/// foreign key does not exist).
pub async fn insert_news_mention(
    pool: &SqlitePool,
    competitor_id: i64,
    analysis_run_id: i64,
    title: &str,
    fields: &NewNewsMention,
) -> Result<NewsMentionRow, DbError> {
    let row = sqlx::query_as::<_, NewsMentionRow>(
        "INSERT INTO news_mentions \
           (competitor_id, analysis_run_id, title, url, source, published_date, content, \
            sentiment_score) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
         RETURNING id, competitor_id, analysis_run_id, title, url, source, published_date, \
                   content, sentiment_score, extracted_at",
    )
    .bind(competitor_id)
    .bind(analysis_run_id)
    .bind(title)
    .bind(&fields.url)
    .bind(&fields.source)
    .bind(&fields.published_date)
    .bind(&fields.content)
    .bind(fields.sentiment_score)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Returns the stored mentions for one competitor, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_news_mentions_for_competitor(
    pool: &SqlitePool,
    competitor_id: i64,
    limit: i64,
) -> Result<Vec<NewsMentionRow>, DbError> {
    let rows = sqlx::query_as::<_, NewsMentionRow>(
        "SELECT id, competitor_id, analysis_run_id, title, url, source, published_date, \
                content, sentiment_score, extracted_at \
         FROM news_mentions \
         WHERE competitor_id = ?1 \
         ORDER BY id DESC \
         LIMIT ?2",
    )
    .bind(competitor_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
