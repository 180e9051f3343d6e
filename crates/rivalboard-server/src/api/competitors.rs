use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rivalboard_core::competitors::{Competitor, CompetitorDraft, CompetitorPatch};
use rivalboard_core::csv;
use rivalboard_core::store::Action;
use rivalboard_db::CompetitorRow;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

const MAX_NAME_LEN: usize = 200;

#[derive(Debug, Serialize)]
pub(super) struct CompetitorItem {
    id: i64,
    name: String,
    website_url: Option<String>,
    twitter_url: Option<String>,
    instagram_url: Option<String>,
    facebook_url: Option<String>,
    reddit_url: Option<String>,
    discord_url: Option<String>,
    industry: Option<String>,
    description: Option<String>,
    logo_url: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CompetitorRow> for CompetitorItem {
    fn from(row: CompetitorRow) -> Self {
        Self {
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
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct NewsItem {
    id: i64,
    title: String,
    url: Option<String>,
    source: Option<String>,
    published_date: Option<String>,
    sentiment_score: Option<f64>,
    extracted_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct DeleteData {
    deleted: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct BulkCreateRequest {
    /// Pasted "Name, Website, Industry, Description" lines.
    #[serde(default)]
    text: Option<String>,
    /// Structured drafts, for clients that already parsed their input.
    #[serde(default)]
    competitors: Vec<CompetitorDraft>,
}

fn validate_name(request_id: &str, name: &str) -> Result<(), ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::new(
            request_id,
            "validation_error",
            "competitor name must not be blank",
        ));
    }
    if trimmed.len() > MAX_NAME_LEN {
        return Err(ApiError::new(
            request_id,
            "validation_error",
            format!("competitor name must be at most {MAX_NAME_LEN} characters"),
        ));
    }
    Ok(())
}

/// Swap the authoritative competitor list from the database back into the
/// in-memory store. Selection referencing deleted competitors is pruned by
/// the reducer.
async fn refresh_store(state: &AppState, request_id: &str) -> Result<(), ApiError> {
    let competitors: Vec<Competitor> = rivalboard_db::list_competitors(&state.pool)
        .await
        .map_err(|e| map_db_error(request_id.to_owned(), &e))?
        .into_iter()
        .map(Into::into)
        .collect();
    state
        .store
        .write()
        .await
        .apply(Action::CompetitorReplaceAll(competitors));
    Ok(())
}

pub(super) async fn list_competitors(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<CompetitorItem>>>, ApiError> {
    let rows = rivalboard_db::list_competitors(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(Into::into).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn create_competitor(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(mut draft): Json<CompetitorDraft>,
) -> Result<impl IntoResponse, ApiError> {
    validate_name(&req_id.0, &draft.name)?;
    draft.name = draft.name.trim().to_string();

    let row = rivalboard_db::insert_competitor(&state.pool, &draft)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    refresh_store(&state, &req_id.0).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: CompetitorItem::from(row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub(super) async fn get_competitor(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<CompetitorItem>>, ApiError> {
    let row = rivalboard_db::get_competitor(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "competitor not found"))?;

    Ok(Json(ApiResponse {
        data: row.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn update_competitor(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(patch): Json<CompetitorPatch>,
) -> Result<Json<ApiResponse<CompetitorItem>>, ApiError> {
    if let Some(ref name) = patch.name {
        validate_name(&req_id.0, name)?;
    }

    let row = rivalboard_db::update_competitor(&state.pool, id, &patch)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "competitor not found"))?;
    refresh_store(&state, &req_id.0).await?;

    Ok(Json(ApiResponse {
        data: row.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn delete_competitor(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<DeleteData>>, ApiError> {
    let deleted = rivalboard_db::delete_competitor(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    if !deleted {
        return Err(ApiError::new(req_id.0, "not_found", "competitor not found"));
    }
    refresh_store(&state, &req_id.0).await?;

    Ok(Json(ApiResponse {
        data: DeleteData { deleted: true },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn bulk_create(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(request): Json<BulkCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut drafts: Vec<CompetitorDraft> = request
        .text
        .as_deref()
        .map(csv::parse_bulk_lines)
        .unwrap_or_default();
    drafts.extend(request.competitors.into_iter().filter(CompetitorDraft::has_name));

    if drafts.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "at least one competitor with a non-blank name is required",
        ));
    }
    for draft in &drafts {
        validate_name(&req_id.0, &draft.name)?;
    }

    let rows = rivalboard_db::insert_competitors_bulk(&state.pool, &drafts)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    refresh_store(&state, &req_id.0).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: rows
                .into_iter()
                .map(CompetitorItem::from)
                .collect::<Vec<_>>(),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub(super) async fn import_csv(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: String,
) -> Result<impl IntoResponse, ApiError> {
    let drafts = csv::parse_competitors_csv(&body);
    if drafts.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "no competitor rows found in CSV",
        ));
    }

    let rows = rivalboard_db::insert_competitors_bulk(&state.pool, &drafts)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    refresh_store(&state, &req_id.0).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: rows
                .into_iter()
                .map(CompetitorItem::from)
                .collect::<Vec<_>>(),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// Raw CSV download, not the JSON envelope.
pub(super) async fn export_csv(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<impl IntoResponse, ApiError> {
    let competitors: Vec<Competitor> = rivalboard_db::list_competitors(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0, &e))?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"competitors.csv\"",
            ),
        ],
        csv::competitors_to_csv(&competitors),
    ))
}

pub(super) async fn list_news(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<NewsItem>>>, ApiError> {
    let exists = rivalboard_db::get_competitor(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .is_some();
    if !exists {
        return Err(ApiError::new(req_id.0, "not_found", "competitor not found"));
    }

    let rows = rivalboard_db::list_news_mentions_for_competitor(&state.pool, id, 50)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows
            .into_iter()
            .map(|m| NewsItem {
                id: m.id,
                title: m.title,
                url: m.url,
                source: m.source,
                published_date: m.published_date,
                sentiment_score: m.sentiment_score,
                extracted_at: m.extracted_at,
            })
            .collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}
