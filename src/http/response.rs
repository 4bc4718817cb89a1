//! Response construction.
//!
//! # Responsibilities
//! - Turn presented pages into HTML responses
//! - Map backend errors on API routes to JSON error bodies
//!
//! # Design Decisions
//! - API errors carry the backend's status code and a short message
//! - Upstream error bodies are passed through as the `error` field

use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::backend::BackendError;
use crate::presentation::Presented;

impl IntoResponse for Presented {
    fn into_response(self) -> Response {
        (self.status, Html(self.body)).into_response()
    }
}

/// A backend failure answered on a JSON API route.
#[derive(Debug)]
pub struct ApiError(pub BackendError);

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.status();
        let error = match &self.0 {
            BackendError::Upstream { body, .. } => json!(body),
            other => json!(other.to_string()),
        };

        tracing::warn!(status = status.as_u16(), error = %self.0, "API request failed");

        let body = json!({
            "error": error,
            "message": self.0.status_message(),
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::UpstreamBody;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_api_error_body() {
        let err = ApiError(BackendError::Upstream {
            status: StatusCode::BAD_GATEWAY,
            body: UpstreamBody::Json(json!({"code": "E1"})),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["error"]["code"], "E1");
        assert_eq!(value["message"], "Upstream server error");
    }

    #[test]
    fn test_presented_is_html() {
        let response = Presented {
            status: StatusCode::NOT_FOUND,
            body: "<p>missing</p>".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()[axum::http::header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
    }
}
