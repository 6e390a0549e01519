//! Error types for the reputation API.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use record_store::{Collection, StoreError};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("User already exists")]
    DuplicateUser,

    #[error("User not found")]
    UserNotFound,

    #[error("Organization already exists")]
    DuplicateOrganization,

    #[error("Organization not found")]
    OrganizationNotFound,

    #[error("NFT already exists")]
    DuplicateNft,

    #[error("NFT not found")]
    NftNotFound,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Too many requests")]
    RateLimitExceeded,

    #[error("Route not found")]
    RouteNotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Store failure. Details are logged, never returned to the client.
    #[error("Storage error")]
    Storage,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    pub code: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::DuplicateUser => (StatusCode::BAD_REQUEST, "DUPLICATE_USER"),
            ApiError::UserNotFound => (StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
            ApiError::DuplicateOrganization => {
                (StatusCode::BAD_REQUEST, "DUPLICATE_ORGANIZATION")
            }
            ApiError::OrganizationNotFound => (StatusCode::NOT_FOUND, "ORGANIZATION_NOT_FOUND"),
            ApiError::DuplicateNft => (StatusCode::BAD_REQUEST, "DUPLICATE_NFT"),
            ApiError::NftNotFound => (StatusCode::NOT_FOUND, "NFT_NOT_FOUND"),
            ApiError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            ApiError::RateLimitExceeded => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED"),
            ApiError::RouteNotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, "METHOD_NOT_ALLOWED"),
            ApiError::Storage => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let body = ErrorResponse {
            message: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate { collection, .. } => match collection {
                Collection::Users => ApiError::DuplicateUser,
                Collection::Organizations => ApiError::DuplicateOrganization,
                Collection::Nfts => ApiError::DuplicateNft,
            },
            StoreError::NotFound { collection, .. } => match collection {
                Collection::Users => ApiError::UserNotFound,
                Collection::Organizations => ApiError::OrganizationNotFound,
                Collection::Nfts => ApiError::NftNotFound,
            },
            other => {
                error!("Record store failure: {}", other);
                ApiError::Storage
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::DuplicateUser.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::UserNotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::RateLimitExceeded.into_response().status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::Storage.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::MethodNotAllowed.into_response().status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(ApiError::DuplicateUser.to_string(), "User already exists");
        assert_eq!(ApiError::UserNotFound.to_string(), "User not found");
        assert_eq!(
            ApiError::OrganizationNotFound.to_string(),
            "Organization not found"
        );
    }

    #[test]
    fn test_store_error_mapping() {
        let err: ApiError = StoreError::Duplicate {
            collection: Collection::Users,
            key: "0x1".into(),
        }
        .into();
        assert!(matches!(err, ApiError::DuplicateUser));

        let err: ApiError = StoreError::NotFound {
            collection: Collection::Nfts,
            key: "abc".into(),
        }
        .into();
        assert!(matches!(err, ApiError::NftNotFound));

        let err: ApiError = StoreError::Encryption("bad key".into()).into();
        assert!(matches!(err, ApiError::Storage));
    }

    #[test]
    fn test_storage_error_hides_details() {
        let io = std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "/var/lib/records.enc",
        );
        let err: ApiError = StoreError::Io(io).into();

        assert_eq!(err.to_string(), "Storage error");
    }
}
