//! Intake for generated social content posted back by external workflow
//! tools. Records are small JSON files under `<data_dir>/social-content/`;
//! the reply carries a `view_url` the workflow can embed in its own output.

use std::io::ErrorKind;
use std::path::PathBuf;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::results_store::valid_store_id;
use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct SocialContentRecord {
    id: String,
    analysis_id: String,
    content: serde_json::Value,
    #[serde(default)]
    source: Option<String>,
    created_at: DateTime<Utc>,
}

/// Workflow tools send camelCase payloads; accept both spellings.
#[derive(Debug, Deserialize)]
struct CreateContentRequest {
    #[serde(alias = "analysisId")]
    analysis_id: String,
    content: serde_json::Value,
    #[serde(default)]
    source: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ContentQuery {
    #[serde(default, alias = "analysisId")]
    analysis_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct CreatedContentData {
    id: String,
    view_url: String,
    created_at: DateTime<Utc>,
}

fn content_dir(state: &AppState) -> PathBuf {
    state.data_dir.join("social-content")
}

fn map_io_error(request_id: String, error: &std::io::Error) -> ApiError {
    tracing::error!(error = %error, "social content io failed");
    ApiError::new(request_id, "internal_error", "social content io failed")
}

pub(super) async fn create_content(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: String,
) -> Result<impl IntoResponse, ApiError> {
    let request: CreateContentRequest = serde_json::from_str(&body).map_err(|e| {
        ApiError::new(
            req_id.0.clone(),
            "validation_error",
            format!("invalid payload: {e}"),
        )
    })?;
    if request.analysis_id.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "analysis_id must not be blank",
        ));
    }

    let record = SocialContentRecord {
        id: Uuid::new_v4().simple().to_string(),
        analysis_id: request.analysis_id.trim().to_string(),
        content: request.content,
        source: request.source,
        created_at: Utc::now(),
    };

    let dir = content_dir(&state);
    fs::create_dir_all(&dir)
        .await
        .map_err(|e| map_io_error(req_id.0.clone(), &e))?;
    let serialized = serde_json::to_string_pretty(&record).map_err(|e| {
        tracing::error!(error = %e, "social content serialization failed");
        ApiError::new(
            req_id.0.clone(),
            "internal_error",
            "failed to store content",
        )
    })?;
    fs::write(dir.join(format!("{}.json", record.id)), serialized)
        .await
        .map_err(|e| map_io_error(req_id.0.clone(), &e))?;

    let view_url = format!(
        "{}/results/{}/content/view/{}",
        state.public_base_url, record.analysis_id, record.id
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: CreatedContentData {
                id: record.id,
                view_url,
                created_at: record.created_at,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub(super) async fn list_content(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ContentQuery>,
) -> Result<Json<ApiResponse<Vec<SocialContentRecord>>>, ApiError> {
    let mut records = Vec::new();

    let mut entries = match fs::read_dir(content_dir(&state)).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Ok(Json(ApiResponse {
                data: records,
                meta: ResponseMeta::new(req_id.0),
            }));
        }
        Err(e) => return Err(map_io_error(req_id.0, &e)),
    };

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| map_io_error(req_id.0.clone(), &e))?
    {
        let path = entry.path();
        if !path.extension().is_some_and(|ext| ext == "json") {
            continue;
        }
        match fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str::<SocialContentRecord>(&raw) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(error = %e, path = %path.display(), "skipping unreadable content record");
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "skipping unreadable content record");
            }
        }
    }

    if let Some(filter) = query.analysis_id.as_deref() {
        records.retain(|r| r.analysis_id == filter);
    }
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(Json(ApiResponse {
        data: records,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_content(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<SocialContentRecord>>, ApiError> {
    if !valid_store_id(&id) {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "content id may only contain letters, digits, '.', '_' and '-'",
        ));
    }

    let raw = match fs::read_to_string(content_dir(&state).join(format!("{id}.json"))).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ApiError::new(req_id.0, "not_found", "content not found"));
        }
        Err(e) => return Err(map_io_error(req_id.0, &e)),
    };

    let record: SocialContentRecord = serde_json::from_str(&raw).map_err(|e| {
        tracing::error!(error = %e, id, "stored content record is not valid JSON");
        ApiError::new(req_id.0.clone(), "internal_error", "stored content is corrupt")
    })?;

    Ok(Json(ApiResponse {
        data: record,
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[cfg(test)]
mod tests {
    use super::super::testing::{seeded_state, send};
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::SqlitePool;

    #[sqlx::test(migrations = "../../migrations")]
    async fn intake_returns_a_view_url(pool: SqlitePool) {
        let state = seeded_state(pool).await;
        let (status, json) = send(
            state,
            "POST",
            "/api/v1/social-content",
            Some(json!({
                "analysisId": "run-1",
                "content": {"platform": "twitter", "post": "Generated copy"},
                "source": "n8n"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        let id = json["data"]["id"].as_str().expect("id");
        assert_eq!(
            json["data"]["view_url"].as_str(),
            Some(format!("http://localhost:3000/results/run-1/content/view/{id}").as_str())
        );
        assert!(json["data"]["created_at"].is_string());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn intake_rejects_payloads_without_required_fields(pool: SqlitePool) {
        let state = seeded_state(pool).await;
        for body in [
            json!({"content": {"post": "x"}}),
            json!({"analysis_id": "  ", "content": {"post": "x"}}),
            json!({"analysis_id": "run-1"}),
        ] {
            let (status, json) =
                send(state.clone(), "POST", "/api/v1/social-content", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["error"]["code"].as_str(), Some("validation_error"));
        }
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn list_filters_by_analysis_id(pool: SqlitePool) {
        let state = seeded_state(pool).await;
        for (analysis, text) in [("run-1", "first"), ("run-1", "second"), ("run-2", "other")] {
            let (status, _) = send(
                state.clone(),
                "POST",
                "/api/v1/social-content",
                Some(json!({"analysis_id": analysis, "content": {"post": text}})),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, json) = send(
            state.clone(),
            "GET",
            "/api/v1/social-content?analysis_id=run-1",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"].as_array().map(Vec::len), Some(2));

        let (_, json) = send(state, "GET", "/api/v1/social-content", None).await;
        assert_eq!(json["data"].as_array().map(Vec::len), Some(3));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn stored_content_is_retrievable_by_id(pool: SqlitePool) {
        let state = seeded_state(pool).await;
        let (_, json) = send(
            state.clone(),
            "POST",
            "/api/v1/social-content",
            Some(json!({"analysis_id": "run-1", "content": {"post": "hello"}})),
        )
        .await;
        let id = json["data"]["id"].as_str().expect("id").to_string();

        let (status, json) = send(
            state.clone(),
            "GET",
            &format!("/api/v1/social-content/{id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["analysis_id"].as_str(), Some("run-1"));
        assert_eq!(json["data"]["content"]["post"].as_str(), Some("hello"));

        let (status, _) = send(state, "GET", "/api/v1/social-content/never-stored", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn listing_an_empty_store_is_fine(pool: SqlitePool) {
        let state = seeded_state(pool).await;
        let (status, json) = send(state, "GET", "/api/v1/social-content", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"].as_array().map(Vec::len), Some(0));
    }
}
