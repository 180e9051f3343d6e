use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rivalboard_core::analysis::{AnalysisRun, AnalysisStatus};
use rivalboard_core::competitors::CompetitorStatus;
use rivalboard_core::store::Action;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

/// One line per analysis on the dashboard; full results come from the
/// analyses routes.
#[derive(Debug, Serialize)]
pub(super) struct AnalysisSummary {
    pub id: String,
    pub name: String,
    pub status: AnalysisStatus,
    pub created_at: DateTime<Utc>,
    pub competitor_count: usize,
}

impl From<&AnalysisRun> for AnalysisSummary {
    fn from(run: &AnalysisRun) -> Self {
        Self {
            id: run.id.clone(),
            name: run.name.clone(),
            status: run.status,
            created_at: run.created_at,
            competitor_count: run.competitor_ids.len(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct DashboardData {
    total_competitors: usize,
    active_competitors: usize,
    selected_competitor_ids: Vec<i64>,
    analyses: Vec<AnalysisSummary>,
    active_analysis_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct SelectionData {
    selected_competitor_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ReplaceSelectionRequest {
    ids: Vec<i64>,
}

pub(super) async fn get_dashboard(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<DashboardData>> {
    let store = state.store.read().await;
    let data = DashboardData {
        total_competitors: store.competitors.len(),
        active_competitors: store
            .competitors
            .iter()
            .filter(|c| c.status == CompetitorStatus::Active)
            .count(),
        selected_competitor_ids: store.selected_competitor_ids.clone(),
        analyses: store.analyses.iter().map(Into::into).collect(),
        active_analysis_id: store.active_analysis_id.clone(),
    };
    drop(store);

    Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    })
}

/// Replace the whole selection. Unknown ids and duplicates are dropped by
/// the reducer rather than rejected, matching how the dashboard's
/// select-all checkbox behaves.
pub(super) async fn replace_selection(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(request): Json<ReplaceSelectionRequest>,
) -> Json<ApiResponse<SelectionData>> {
    let mut store = state.store.write().await;
    store.apply(Action::SelectAll { ids: request.ids });
    let data = SelectionData {
        selected_competitor_ids: store.selected_competitor_ids.clone(),
    };
    drop(store);

    Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    })
}

pub(super) async fn toggle_selection(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<SelectionData>>, ApiError> {
    let mut store = state.store.write().await;
    if store.competitor(id).is_none() {
        return Err(ApiError::new(req_id.0, "not_found", "competitor not found"));
    }
    store.apply(Action::SelectToggle { id });
    let data = SelectionData {
        selected_competitor_ids: store.selected_competitor_ids.clone(),
    };
    drop(store);

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
