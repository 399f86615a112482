//! Error handling module
//!
//! Centralized error types and HTTP response conversion. Every error body is
//! a single JSON string.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::auth::{PasswordError, TokenError};
use crate::domain::{Capability, DomainError};
use crate::store::StoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

pub const ACCESS_DENIED: &str = "access denied";
pub const INVALID_TOKEN: &str =
    "the provided jwt token is invalid or has expired. please check the token and try again.";
pub const INVALID_BODY: &str = "error parsing json from request body";
const INTERNAL: &str = "internal server error";

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// No usable identity on the request
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Authenticated, but the caller's membership does not allow the action
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but the resource belongs to someone else
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    // Server errors (5xx)
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Domain(err) => match err {
                DomainError::NotAMember { .. } | DomainError::MissingCapability { .. } => {
                    StatusCode::UNAUTHORIZED
                }
                DomainError::NotOwner { .. } => StatusCode::FORBIDDEN,
                DomainError::MissingField(_) => StatusCode::BAD_REQUEST,
            },
            AppError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
            AppError::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
            AppError::Token(err) if !err.is_internal() => StatusCode::UNAUTHORIZED,
            AppError::Store(_)
            | AppError::Token(_)
            | AppError::Password(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand back to the caller
    fn public_message(&self) -> String {
        match self {
            AppError::BadRequest(msg)
            | AppError::Unauthenticated(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => msg.clone(),
            AppError::Domain(err) => match err {
                DomainError::NotAMember { .. } => {
                    "the user is not part of the list of members".to_string()
                }
                DomainError::MissingCapability {
                    capability: Capability::Admin,
                    ..
                } => "administrator privileges are needed to modify the member list".to_string(),
                DomainError::MissingCapability { .. } | DomainError::NotOwner { .. } => {
                    ACCESS_DENIED.to_string()
                }
                DomainError::MissingField(_) => err.to_string(),
            },
            AppError::Store(StoreError::NotFound) => "resource not found".to_string(),
            AppError::Store(StoreError::Conflict(_)) => "resource already exists".to_string(),
            AppError::Token(err) if !err.is_internal() => INVALID_TOKEN.to_string(),
            _ => INTERNAL.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        } else if let AppError::Domain(err) = &self {
            if err.is_access_denial() {
                tracing::info!(error = %err, "access denied");
            } else {
                tracing::debug!(error = %err, "request rejected");
            }
        }

        (status, Json(self.public_message())).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "rejected request body");
        AppError::BadRequest(INVALID_BODY.to_string())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Unauthenticated("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Store(StoreError::Unavailable("down".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_domain_denials() {
        let non_member = AppError::from(DomainError::NotAMember { account_id: 1 });
        assert_eq!(non_member.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            non_member.public_message(),
            "the user is not part of the list of members"
        );

        let non_admin = AppError::from(DomainError::MissingCapability {
            account_id: 1,
            capability: Capability::Admin,
        });
        assert_eq!(non_admin.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            non_admin.public_message(),
            "administrator privileges are needed to modify the member list"
        );

        let not_owner = AppError::from(DomainError::NotOwner { caller: 1, target: 2 });
        assert_eq!(not_owner.status(), StatusCode::FORBIDDEN);
        assert_eq!(not_owner.public_message(), ACCESS_DENIED);
    }

    #[test]
    fn test_internal_detail_not_exposed() {
        let err = AppError::Internal("connection reset by peer".into());
        assert_eq!(err.public_message(), "internal server error");

        let err = AppError::Token(TokenError::MalformedUserId(serde_json::json!("7")));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "internal server error");
    }

    #[test]
    fn test_token_rejection_is_unauthenticated() {
        let err = AppError::Token(TokenError::MissingUserId);
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.public_message(), INVALID_TOKEN);
    }
}
