use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use rivalboard_core::analysis::{new_run_id, AnalysisParameters, AnalysisRun, AnalysisStatus, Insight};
use rivalboard_core::store::Action;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::dashboard::AnalysisSummary;
use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct CreateAnalysisRequest {
    name: String,
    competitor_ids: Vec<i64>,
    #[serde(default)]
    parameters: AnalysisParameters,
}

#[derive(Debug, Serialize)]
pub(super) struct ActiveAnalysisData {
    active_analysis_id: Option<String>,
}

pub(super) async fn list_analyses(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Vec<AnalysisSummary>>> {
    let store = state.store.read().await;
    let data: Vec<AnalysisSummary> = store.analyses.iter().map(Into::into).collect();
    drop(store);

    Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    })
}

pub(super) async fn create_draft(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(request): Json<CreateAnalysisRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.name.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "analysis name must not be blank",
        ));
    }
    if request.competitor_ids.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "select at least one competitor",
        ));
    }

    let id = new_run_id();
    let mut store = state.store.write().await;
    if let Some(unknown) = request
        .competitor_ids
        .iter()
        .find(|&&cid| store.competitor(cid).is_none())
    {
        let message = format!("unknown competitor id {unknown}");
        drop(store);
        return Err(ApiError::new(req_id.0, "validation_error", message));
    }

    store.apply(Action::AnalysisCreateDraft {
        id: id.clone(),
        name: request.name.trim().to_string(),
        competitor_ids: request.competitor_ids,
        parameters: request.parameters,
    });
    let run = store.analysis(&id).cloned();
    drop(store);

    let Some(run) = run else {
        return Err(ApiError::new(
            req_id.0,
            "internal_error",
            "draft was not recorded",
        ));
    };

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: run,
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub(super) async fn get_analysis(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<AnalysisRun>>, ApiError> {
    let run = state.store.read().await.analysis(&id).cloned();
    let Some(run) = run else {
        return Err(ApiError::new(req_id.0, "not_found", "analysis not found"));
    };

    Ok(Json(ApiResponse {
        data: run,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Complete a run with the deterministic mock engine. Idempotent: a run
/// that is already completed is returned as-is and not persisted again.
pub(super) async fn complete_analysis(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<AnalysisRun>>, ApiError> {
    let completed = {
        let mut store = state.store.write().await;
        let existing = store.analysis(&id).cloned();
        match existing {
            None => {
                drop(store);
                return Err(ApiError::new(req_id.0, "not_found", "analysis not found"));
            }
            Some(run) if run.status == AnalysisStatus::Completed => {
                drop(store);
                return Ok(Json(ApiResponse {
                    data: run,
                    meta: ResponseMeta::new(req_id.0),
                }));
            }
            Some(run) => {
                // A linked competitor may have been deleted since the draft
                // was created; completing such a run would leave it flipped
                // in the store while the database insert fails its FK.
                let missing = run
                    .competitor_ids
                    .iter()
                    .copied()
                    .find(|&cid| store.competitor(cid).is_none());
                if let Some(missing) = missing {
                    drop(store);
                    return Err(ApiError::new(
                        req_id.0,
                        "validation_error",
                        format!("competitor {missing} no longer exists; the run cannot be completed"),
                    ));
                }
            }
        }
        store.apply(Action::AnalysisCompleteMock { id: id.clone() });
        store.analysis(&id).cloned()
    };

    let Some(run) = completed else {
        return Err(ApiError::new(
            req_id.0,
            "internal_error",
            "completed run went missing",
        ));
    };

    // Persist the finished run so insights survive restarts.
    rivalboard_db::record_completed_run(&state.pool, &run)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: run,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn activate_analysis(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ActiveAnalysisData>>, ApiError> {
    let mut store = state.store.write().await;
    if store.analysis(&id).is_none() {
        drop(store);
        return Err(ApiError::new(req_id.0, "not_found", "analysis not found"));
    }
    store.apply(Action::AnalysisSetActive { id: Some(id) });
    let data = ActiveAnalysisData {
        active_analysis_id: store.active_analysis_id.clone(),
    };
    drop(store);

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_insights(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Insight>>>, ApiError> {
    let store = state.store.read().await;
    let Some(run) = store.analysis(&id) else {
        drop(store);
        return Err(ApiError::new(req_id.0, "not_found", "analysis not found"));
    };
    let data = run.insights.clone().unwrap_or_default();
    drop(store);

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
