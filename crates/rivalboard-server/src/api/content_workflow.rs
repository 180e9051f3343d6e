//! Proxy for the external content-generation webhook. The browser never
//! talks to the workflow tool directly; this route relays the payload and
//! hands the reply back untouched.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::json;

use crate::middleware::RequestId;
use crate::workflow::{WorkflowError, WorkflowReply};

use super::{ApiError, AppState};

pub(super) async fn trigger(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: String,
) -> Result<Response, ApiError> {
    let Some(client) = state.workflow.clone() else {
        return Err(ApiError::new(
            req_id.0,
            "service_unavailable",
            "content workflow is not configured",
        ));
    };

    // JSON bodies go through verbatim; anything else is wrapped so the
    // workflow still receives a JSON document.
    let mut payload: serde_json::Value =
        serde_json::from_str(&body).unwrap_or_else(|_| json!({ "raw": body }));
    if let Some(object) = payload.as_object_mut() {
        let analysis_id = object
            .get("analysis_id")
            .or_else(|| object.get("analysisId"))
            .or_else(|| object.get("analysis").and_then(|a| a.get("id")))
            .cloned();
        if let Some(id) = analysis_id {
            object.entry("analysis_id_for_store").or_insert(id);
        }
        // Tell the workflow where to post generated content back to.
        object.entry("content_store_url").or_insert(json!(format!(
            "{}/api/v1/social-content",
            state.public_base_url
        )));
    }

    match client.trigger(&payload).await {
        Ok(WorkflowReply::Json(value)) => Ok(Json(value).into_response()),
        Ok(WorkflowReply::Text(text)) => Ok(Json(json!({ "raw": text })).into_response()),
        Err(WorkflowError::UpstreamStatus { status, detail }) => {
            tracing::warn!(status, "content workflow reported an error");
            let message = if detail.is_empty() {
                "content workflow reported an error".to_string()
            } else {
                detail
            };
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            Ok((status, Json(ApiError::new(req_id.0, "bad_gateway", message))).into_response())
        }
        Err(e) => {
            tracing::error!(error = %e, "content workflow unreachable");
            Err(ApiError::new(
                req_id.0,
                "bad_gateway",
                "content workflow is unreachable",
            ))
        }
    }
}
