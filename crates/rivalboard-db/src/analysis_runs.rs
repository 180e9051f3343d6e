//! Database operations for `analysis_runs`, `analysis_competitors`, and
//! `insights`. Runs are written in one shot when a mock completion happens;
//! there is no in-database run lifecycle.

use chrono::{DateTime, Utc};
use rivalboard_core::analysis::AnalysisRun;
use sqlx::SqlitePool;

use crate::DbError;

/// A row from the `analysis_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnalysisRunRow {
    pub id: i64,
    pub name: String,
    pub status: String,
    pub parameters: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A row from the `insights` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InsightRow {
    pub id: i64,
    pub analysis_run_id: i64,
    pub insight_type: String,
    pub category: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub actionable_recommendation: Option<String>,
    pub supporting_data: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Persists a completed mock run: the run row, its competitor links, and its
/// insights, all inside one transaction. Returns the new run's database id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; nothing is written in
/// that case.
pub async fn record_completed_run(pool: &SqlitePool, run: &AnalysisRun) -> Result<i64, DbError> {
    let parameters = serde_json::to_string(&run.parameters).unwrap_or_default();
    let completed_at = Utc::now();

    let mut tx = pool.begin().await?;

    let run_id: i64 = sqlx::query_scalar(
        "INSERT INTO analysis_runs (name, status, parameters, started_at, completed_at) \
         VALUES (?1, 'completed', ?2, ?3, ?4) \
         RETURNING id",
    )
    .bind(&run.name)
    .bind(parameters)
    .bind(run.created_at)
    .bind(completed_at)
    .fetch_one(&mut *tx)
    .await?;

    for &competitor_id in &run.competitor_ids {
        sqlx::query(
            "INSERT OR IGNORE INTO analysis_competitors (analysis_run_id, competitor_id) \
             VALUES (?1, ?2)",
        )
        .bind(run_id)
        .bind(competitor_id)
        .execute(&mut *tx)
        .await?;
    }

    for insight in run.insights.as_deref().unwrap_or_default() {
        sqlx::query(
            "INSERT INTO insights \
               (analysis_run_id, insight_type, category, title, priority, \
                actionable_recommendation) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(run_id)
        .bind(insight.category.as_str())
        .bind(insight.category.as_str())
        .bind(&insight.title)
        .bind(insight.priority.as_str())
        .bind(&insight.recommendation)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(run_id)
}

/// Returns the most recent runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_runs(pool: &SqlitePool, limit: i64) -> Result<Vec<AnalysisRunRow>, DbError> {
    let rows = sqlx::query_as::<_, AnalysisRunRow>(
        "SELECT id, name, status, parameters, started_at, completed_at, created_by, created_at \
         FROM analysis_runs \
         ORDER BY id DESC \
         LIMIT ?1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Returns one run with its linked competitor ids, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any query fails.
pub async fn get_run(
    pool: &SqlitePool,
    run_id: i64,
) -> Result<Option<(AnalysisRunRow, Vec<i64>)>, DbError> {
    let row = sqlx::query_as::<_, AnalysisRunRow>(
        "SELECT id, name, status, parameters, started_at, completed_at, created_by, created_at \
         FROM analysis_runs WHERE id = ?1",
    )
    .bind(run_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let competitor_ids: Vec<i64> = sqlx::query_scalar(
        "SELECT competitor_id FROM analysis_competitors \
         WHERE analysis_run_id = ?1 ORDER BY competitor_id",
    )
    .bind(run_id)
    .fetch_all(pool)
    .await?;

    Ok(Some((row, competitor_ids)))
}

/// Returns all insights recorded for a run, in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_insights_for_run(
    pool: &SqlitePool,
    run_id: i64,
) -> Result<Vec<InsightRow>, DbError> {
    let rows = sqlx::query_as::<_, InsightRow>(
        "SELECT id, analysis_run_id, insight_type, category, title, description, priority, \
                actionable_recommendation, supporting_data, created_at \
         FROM insights \
         WHERE analysis_run_id = ?1 \
         ORDER BY id",
    )
    .bind(run_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
