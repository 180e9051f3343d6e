//! HTTP client for the external content-generation webhook.
//!
//! The dashboard does not generate marketing content itself; it relays the
//! request to a workflow automation webhook (n8n or similar) and hands the
//! reply back untouched. Wraps `reqwest` with timeout handling and a typed
//! error for each failure mode the proxy endpoint reports.

use std::time::Duration;

use reqwest::{Client, Url};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The webhook URL from configuration does not parse.
    #[error("invalid webhook URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Network failure, timeout, or the client could not be built.
    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The webhook answered with a non-2xx status.
    #[error("webhook returned status {status}")]
    UpstreamStatus { status: u16, detail: String },
}

/// What the webhook answered with. JSON replies are parsed so the caller can
/// relay them verbatim; anything else is wrapped as raw text.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowReply {
    Json(serde_json::Value),
    Text(String),
}

/// Client for the content workflow webhook.
///
/// Use [`WorkflowClient::new`] with the configured URL; tests point it at a
/// mock server instead.
#[derive(Debug)]
pub struct WorkflowClient {
    client: Client,
    webhook_url: Url,
}

impl WorkflowClient {
    /// Creates a client posting to `webhook_url`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidUrl`] if the URL does not parse and
    /// [`WorkflowError::Http`] if the underlying `reqwest::Client` cannot be
    /// constructed.
    pub fn new(webhook_url: &str, timeout_secs: u64) -> Result<Self, WorkflowError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("rivalboard/0.1 (content-workflow)")
            .build()?;

        let parsed = Url::parse(webhook_url).map_err(|e| WorkflowError::InvalidUrl {
            url: webhook_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            webhook_url: parsed,
        })
    }

    /// Posts `payload` to the webhook and returns its reply.
    ///
    /// # Errors
    ///
    /// - [`WorkflowError::Http`] on network failure or timeout.
    /// - [`WorkflowError::UpstreamStatus`] when the webhook answers with a
    ///   non-2xx status; the response body is carried in `detail`.
    pub async fn trigger(&self, payload: &serde_json::Value) -> Result<WorkflowReply, WorkflowError> {
        let response = self
            .client
            .post(self.webhook_url.clone())
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("application/json"));
        let body = response.text().await?;

        if !status.is_success() {
            return Err(WorkflowError::UpstreamStatus {
                status: status.as_u16(),
                detail: body,
            });
        }

        if is_json {
            if let Ok(value) = serde_json::from_str(&body) {
                return Ok(WorkflowReply::Json(value));
            }
        }
        Ok(WorkflowReply::Text(body))
    }
}
