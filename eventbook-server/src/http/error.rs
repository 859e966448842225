//! API error types with IntoResponse
//!
//! Errors are converted to JSON responses with appropriate status codes.
//! Booking failures never reach this type; the submit action answers
//! `{ "success": false }` instead.

use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Request body could not be parsed (400 / 415 / 422)
    BadRequest { status: StatusCode, message: String },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::BadRequest { status, message } => {
                tracing::debug!(%status, "Rejected request: {}", message);
                (
                    *status,
                    json!({
                        "error": "bad_request",
                        "message": message
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::BadRequest {
            status: e.status(),
            message: e.body_text(),
        }
    }
}

impl From<FormRejection> for ApiError {
    fn from(e: FormRejection) -> Self {
        Self::BadRequest {
            status: e.status(),
            message: e.body_text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn bad_request_keeps_status_and_message() {
        let err = ApiError::BadRequest {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "missing field `email`".into(),
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "bad_request");
        assert_eq!(json["message"], "missing field `email`");
    }
}
