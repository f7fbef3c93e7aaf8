//! Error responses.
//!
//! Every failure is a `400` with the `{success: false, error}` envelope.
//! Business outcomes carry their own message; anything else is logged and
//! reported with a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use regionhub_core::DomainError;
use regionhub_infra::RegionServiceError;

use crate::app::dto::BaseResponse;

/// Message returned for failures whose details stay in the logs.
pub const GENERIC_ERROR: &str = "an error occurred";

/// Message returned when the create request could not be queued.
pub const DISPATCH_FAILED: &str = "region create request could not be queued";

pub fn json_failure(message: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, Json(BaseResponse::failure(message))).into_response()
}

pub fn service_error_to_response(err: RegionServiceError) -> Response {
    match err {
        RegionServiceError::NotFound | RegionServiceError::AlreadyExists => json_failure(err.to_string()),
        other => {
            error!(error = %other, "region request failed");
            json_failure(GENERIC_ERROR)
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    json_failure(err.to_string())
}

/// Map an extractor rejection (bad JSON, bad query string, bad path).
pub fn rejection_to_response(rejection: impl std::fmt::Display) -> Response {
    json_failure(rejection.to_string())
}

#[cfg(test)]
mod tests {
    use regionhub_infra::store::StoreError;

    use super::*;

    async fn body_of(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn business_errors_keep_their_message() {
        let response = service_error_to_response(RegionServiceError::NotFound);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_of(response).await,
            serde_json::json!({"success": false, "error": "region not found"})
        );
    }

    #[tokio::test]
    async fn transport_errors_are_hidden_behind_generic_message() {
        let response = service_error_to_response(RegionServiceError::Store(StoreError::Unavailable(
            "pool closed".to_string(),
        )));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_of(response).await["error"], GENERIC_ERROR);
    }
}
