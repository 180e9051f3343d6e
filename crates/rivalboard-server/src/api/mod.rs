mod analyses;
mod competitors;
mod content_workflow;
mod dashboard;
mod results_store;
mod social_content;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use rivalboard_core::store::DashboardState;
use serde::Serialize;
use sqlx::SqlitePool;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::{request_id, RequestId};
use crate::workflow::WorkflowClient;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    /// In-memory dashboard state, seeded from the database at startup.
    /// Competitor mutations write the database first and then swap the
    /// authoritative list back in.
    pub store: Arc<RwLock<DashboardState>>,
    pub data_dir: PathBuf,
    pub public_base_url: String,
    pub workflow: Option<Arc<WorkflowClient>>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
struct HealthData {
    status: &'static str,
    database: &'static str,
    sqlite_version: Option<String>,
    schema_version: Option<i64>,
    tables: Vec<String>,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "bad_gateway" => StatusCode::BAD_GATEWAY,
            "service_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_db_error(request_id: String, error: &rivalboard_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

/// The dashboard is a browser app served from arbitrary origins in demo
/// setups, and the social-content intake is called by external workflow
/// tools, so CORS stays wide open.
fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
        .max_age(Duration::from_secs(86_400))
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route(
            "/api/v1/competitors",
            get(competitors::list_competitors).post(competitors::create_competitor),
        )
        .route("/api/v1/competitors/bulk", post(competitors::bulk_create))
        .route(
            "/api/v1/competitors/import-csv",
            post(competitors::import_csv),
        )
        .route(
            "/api/v1/competitors/export.csv",
            get(competitors::export_csv),
        )
        .route(
            "/api/v1/competitors/{id}",
            get(competitors::get_competitor)
                .patch(competitors::update_competitor)
                .delete(competitors::delete_competitor),
        )
        .route(
            "/api/v1/competitors/{id}/news",
            get(competitors::list_news),
        )
        .route("/api/v1/dashboard", get(dashboard::get_dashboard))
        .route("/api/v1/selection", put(dashboard::replace_selection))
        .route(
            "/api/v1/selection/{id}/toggle",
            post(dashboard::toggle_selection),
        )
        .route(
            "/api/v1/analyses",
            get(analyses::list_analyses).post(analyses::create_draft),
        )
        .route("/api/v1/analyses/{id}", get(analyses::get_analysis))
        .route(
            "/api/v1/analyses/{id}/complete",
            post(analyses::complete_analysis),
        )
        .route(
            "/api/v1/analyses/{id}/activate",
            post(analyses::activate_analysis),
        )
        .route(
            "/api/v1/analyses/{id}/insights",
            get(analyses::list_insights),
        )
        .route(
            "/api/v1/results/{id}",
            get(results_store::fetch_result)
                .put(results_store::save_result)
                .post(results_store::save_result),
        )
        .route(
            "/api/v1/social-content",
            get(social_content::list_content).post(social_content::create_content),
        )
        .route(
            "/api/v1/social-content/{id}",
            get(social_content::get_content),
        )
        .route("/api/v1/content-workflow", post(content_workflow::trigger))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match rivalboard_db::schema_info(&state.pool).await {
        Ok(info) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                    sqlite_version: Some(info.sqlite_version),
                    schema_version: Some(info.applied_migrations),
                    tables: info.tables,
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                        sqlite_version: None,
                        schema_version: None,
                        tables: Vec::new(),
                    },
                    meta,
                }),
            )
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for route tests: a fully wired [`AppState`] over a
    //! fresh database plus a small request helper.

    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use rivalboard_core::competitors::builtin_demo_competitors;
    use tower::ServiceExt;
    use uuid::Uuid;

    pub(crate) async fn seeded_state(pool: SqlitePool) -> AppState {
        let demo = builtin_demo_competitors();
        rivalboard_db::seed_competitors_if_empty(&pool, &demo)
            .await
            .expect("seed");
        state_over(pool).await
    }

    /// Build state over whatever the database currently holds.
    pub(crate) async fn state_over(pool: SqlitePool) -> AppState {
        let competitors = rivalboard_db::list_competitors(&pool)
            .await
            .expect("list competitors")
            .into_iter()
            .map(Into::into)
            .collect();
        AppState {
            pool,
            store: Arc::new(RwLock::new(DashboardState::seeded(competitors))),
            data_dir: std::env::temp_dir().join(format!("rivalboard-test-{}", Uuid::new_v4())),
            public_base_url: "http://localhost:3000".to_string(),
            workflow: None,
        }
    }

    /// Fire one request at a fresh router over `state` and decode the JSON
    /// body (empty bodies decode as `null`).
    pub(crate) async fn send(
        state: AppState,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let app = build_app(state);
        let request = match body {
            Some(json) => Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => Request::builder().method(method).uri(uri).body(Body::empty()),
        }
        .expect("request");

        let response = app.oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{seeded_state, send};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[test]
    fn api_error_codes_map_to_statuses() {
        let cases = [
            ("not_found", StatusCode::NOT_FOUND),
            ("validation_error", StatusCode::BAD_REQUEST),
            ("bad_request", StatusCode::BAD_REQUEST),
            ("bad_gateway", StatusCode::BAD_GATEWAY),
            ("service_unavailable", StatusCode::SERVICE_UNAVAILABLE),
            ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (code, status) in cases {
            let response = ApiError::new("req-1", code, "boom").into_response();
            assert_eq!(response.status(), status, "code {code}");
        }
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn health_reports_schema_facts(pool: SqlitePool) {
        let state = seeded_state(pool).await;
        let (status, json) = send(state, "GET", "/api/v1/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["status"].as_str(), Some("ok"));
        assert_eq!(json["data"]["database"].as_str(), Some("ok"));
        assert!(json["data"]["schema_version"].as_i64() >= Some(1));
        assert!(json["data"]["tables"]
            .as_array()
            .expect("tables array")
            .iter()
            .any(|t| t == "competitors"));
        assert!(json["meta"]["request_id"].is_string());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn request_id_header_is_echoed(pool: SqlitePool) {
        let state = seeded_state(pool).await;
        let app = build_app(state);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .header("x-request-id", "trace-me-123")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(
            response
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok()),
            Some("trace-me-123")
        );
    }
}
