use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::store::StoreError;

#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Upstream(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg).into_response(),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg).into_response(),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg).into_response(),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg).into_response(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        match value {
            // the two commit conflicts stay distinguishable for the UI
            StoreError::DuplicateBooking | StoreError::AlreadyCheckedIn => {
                ApiError::Conflict(value.to_string())
            }
            StoreError::Http(err) => {
                error!("HTTP error: {err}");
                ApiError::Upstream("Failed to reach data store".into())
            }
            StoreError::Api { status, message } => {
                error!("store error {status}: {message}");
                ApiError::Upstream("Data store request failed".into())
            }
            StoreError::BadCount => ApiError::Internal(value.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_conflicts_stay_distinct() {
        let dup: ApiError = StoreError::DuplicateBooking.into();
        let checked: ApiError = StoreError::AlreadyCheckedIn.into();
        match (&dup, &checked) {
            (ApiError::Conflict(a), ApiError::Conflict(b)) => assert_ne!(a, b),
            other => panic!("expected conflicts, got {other:?}"),
        }
    }

    #[test]
    fn test_store_api_error_maps_to_upstream() {
        let err: ApiError = StoreError::Api {
            status: 500,
            message: "boom".into(),
        }
        .into();
        assert!(matches!(err, ApiError::Upstream(_)));
    }
}
