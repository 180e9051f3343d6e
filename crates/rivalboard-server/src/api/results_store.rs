//! File-backed JSON store for exported analysis snapshots. Each id maps to
//! one file under `<data_dir>/analysis-results/`; writes replace the whole
//! document (last writer wins).

use std::io::ErrorKind;
use std::path::PathBuf;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Serialize;
use tokio::fs;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

const MAX_ID_LEN: usize = 128;

#[derive(Debug, Serialize)]
pub(super) struct StoredResult {
    id: String,
    data: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub(super) struct SavedData {
    id: String,
    saved: bool,
}

/// Ids become file names, so only a conservative charset is allowed.
pub(super) fn valid_store_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

fn result_path(state: &AppState, id: &str) -> PathBuf {
    state
        .data_dir
        .join("analysis-results")
        .join(format!("{id}.json"))
}

fn check_id(request_id: &str, id: &str) -> Result<(), ApiError> {
    if valid_store_id(id) {
        Ok(())
    } else {
        Err(ApiError::new(
            request_id,
            "validation_error",
            "result id may only contain letters, digits, '.', '_' and '-'",
        ))
    }
}

fn map_io_error(request_id: String, error: &std::io::Error) -> ApiError {
    tracing::error!(error = %error, "results store io failed");
    ApiError::new(request_id, "internal_error", "results store io failed")
}

pub(super) async fn fetch_result(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<StoredResult>>, ApiError> {
    check_id(&req_id.0, &id)?;

    let raw = match fs::read_to_string(result_path(&state, &id)).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ApiError::new(
                req_id.0,
                "not_found",
                "no stored result for this id",
            ));
        }
        Err(e) => return Err(map_io_error(req_id.0, &e)),
    };

    let data: serde_json::Value = serde_json::from_str(&raw).map_err(|e| {
        tracing::error!(error = %e, id, "stored result is not valid JSON");
        ApiError::new(
            req_id.0.clone(),
            "internal_error",
            "stored result is corrupt",
        )
    })?;

    Ok(Json(ApiResponse {
        data: StoredResult { id, data },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn save_result(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    body: String,
) -> Result<impl IntoResponse, ApiError> {
    check_id(&req_id.0, &id)?;

    let data: serde_json::Value = serde_json::from_str(&body).map_err(|_| {
        ApiError::new(
            req_id.0.clone(),
            "bad_request",
            "request body must be valid JSON",
        )
    })?;

    let path = result_path(&state, &id);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| map_io_error(req_id.0.clone(), &e))?;
    }
    let pretty = serde_json::to_string_pretty(&data).unwrap_or_else(|_| data.to_string());
    fs::write(&path, pretty)
        .await
        .map_err(|e| map_io_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: SavedData { id, saved: true },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::super::testing::{seeded_state, send};
    use super::valid_store_id;
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::SqlitePool;

    #[test]
    fn store_ids_are_restricted_to_a_safe_charset() {
        assert!(valid_store_id("run-1"));
        assert!(valid_store_id("run_1.v2"));
        assert!(!valid_store_id(""));
        assert!(!valid_store_id("../etc/passwd"));
        assert!(!valid_store_id("a/b"));
        assert!(!valid_store_id(&"x".repeat(200)));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn save_then_fetch_round_trip(pool: SqlitePool) {
        let state = seeded_state(pool).await;
        let snapshot = json!({"analysis": {"id": "run-1"}, "scores": [1, 2, 3]});

        let (status, json) = send(
            state.clone(),
            "PUT",
            "/api/v1/results/run-1",
            Some(snapshot.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["data"]["saved"].as_bool(), Some(true));

        let (status, json) = send(state, "GET", "/api/v1/results/run-1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["id"].as_str(), Some("run-1"));
        assert_eq!(json["data"]["data"], snapshot);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn post_overwrites_like_put(pool: SqlitePool) {
        let state = seeded_state(pool).await;
        for value in [json!({"version": 1}), json!({"version": 2})] {
            let (status, _) = send(
                state.clone(),
                "POST",
                "/api/v1/results/run-2",
                Some(value),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (_, json) = send(state, "GET", "/api/v1/results/run-2", None).await;
        assert_eq!(json["data"]["data"]["version"].as_i64(), Some(2));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn unknown_id_is_404_and_bad_id_is_400(pool: SqlitePool) {
        let state = seeded_state(pool).await;
        let (status, _) = send(state.clone(), "GET", "/api/v1/results/never-saved", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, json) = send(state, "GET", "/api/v1/results/bad%2Fid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"].as_str(), Some("validation_error"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn non_json_body_is_rejected(pool: SqlitePool) {
        use super::super::build_app;
        use axum::body::Body;
        use axum::http::Request;
        use tower::ServiceExt;

        let state = seeded_state(pool).await;
        let app = build_app(state);
        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/api/v1/results/run-3")
                    .body(Body::from("not json at all"))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
