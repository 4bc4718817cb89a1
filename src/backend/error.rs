//! Backend error definitions.

use axum::http::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Body of a non-2xx backend response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UpstreamBody {
    Json(serde_json::Value),
    Text(String),
}

impl UpstreamBody {
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str(raw) {
            Ok(value) => UpstreamBody::Json(value),
            Err(_) if raw.is_empty() => UpstreamBody::Text("Empty response".to_string()),
            Err(_) => UpstreamBody::Text(raw.to_string()),
        }
    }
}

impl std::fmt::Display for UpstreamBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpstreamBody::Json(value) => write!(f, "{value}"),
            UpstreamBody::Text(text) => f.write_str(text),
        }
    }
}

/// Errors that can occur while talking to backend services.
#[derive(Debug, Error)]
pub enum BackendError {
    /// No route or mapping exists for the presented URL.
    #[error("Unable to locate content ID")]
    Unmapped,

    /// The backend answered with a non-2xx status.
    #[error("Upstream returned {status}: {body}")]
    Upstream { status: StatusCode, body: UpstreamBody },

    /// The backend could not be reached (refused, timed out, unresolved).
    #[error("Service unavailable: {source}")]
    ServiceUnavailable {
        #[source]
        source: reqwest::Error,
    },

    /// Any other client-side failure.
    #[error("Backend request failed: {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },

    /// A 2xx body that did not decode as the documented shape.
    #[error("Invalid backend response: {source}")]
    InvalidResponse {
        #[source]
        source: serde_json::Error,
    },

    /// A backend URL could not be built.
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

impl BackendError {
    /// Classify a `reqwest` failure.
    pub fn from_transport(source: reqwest::Error) -> Self {
        if source.is_connect() || source.is_timeout() {
            BackendError::ServiceUnavailable { source }
        } else {
            BackendError::Transport { source }
        }
    }

    /// Status code a page failing with this error is served with.
    pub fn status(&self) -> StatusCode {
        match self {
            BackendError::Unmapped => StatusCode::NOT_FOUND,
            BackendError::Upstream { status, .. } => *status,
            BackendError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            BackendError::Transport { .. }
            | BackendError::InvalidResponse { .. }
            | BackendError::InvalidUrl(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short human message for the status.
    pub fn status_message(&self) -> &'static str {
        status_message(self.status())
    }
}

pub fn status_message(status: StatusCode) -> &'static str {
    if status == StatusCode::NOT_FOUND {
        "Required resource not found"
    } else {
        "Upstream server error"
    }
}

/// Result type for backend calls.
pub type BackendResult<T> = Result<T, BackendError>;
