//! Closed error taxonomy for the auth flows.
//!
//! Every failure leaving this crate is one of five kinds with a stable
//! `(code, message, status)` triple. Messages are static and generic so the
//! response never reveals which internal branch was taken; the one exception
//! is validation detail, which concerns input the caller is actively typing,
//! not account state.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

/// Externally visible failure kinds.
///
/// `InvalidProof` and `ExpiredProof` are distinguished here for logging and
/// for flows that want to prompt "request a new link"; both render with the
/// same status so callers cannot probe which one a given code produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthErrorKind {
    Validation,
    InvalidProof,
    ExpiredProof,
    Unauthenticated,
    ServerError,
}

impl AuthErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Validation => "validation_error",
            Self::InvalidProof => "invalid_proof",
            Self::ExpiredProof => "expired_proof",
            Self::Unauthenticated => "unauthenticated",
            Self::ServerError => "server_error",
        }
    }

    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::Validation | Self::InvalidProof | Self::ExpiredProof => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// One failed validation rule, named for the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    #[must_use]
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

/// An auth failure shaped for the response envelope.
///
/// `details` is only populated by [`AuthError::validation`]; the other
/// constructors carry no structured detail by design.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct AuthError {
    kind: AuthErrorKind,
    message: String,
    details: Vec<FieldError>,
}

impl AuthError {
    #[must_use]
    pub fn validation(details: Vec<FieldError>) -> Self {
        Self {
            kind: AuthErrorKind::Validation,
            message: "Invalid input".to_string(),
            details,
        }
    }

    #[must_use]
    pub fn invalid_proof() -> Self {
        Self {
            kind: AuthErrorKind::InvalidProof,
            message: "Authentication failed".to_string(),
            details: Vec::new(),
        }
    }

    #[must_use]
    pub fn expired_proof() -> Self {
        Self {
            kind: AuthErrorKind::ExpiredProof,
            message: "This link has expired. Please request a new one".to_string(),
            details: Vec::new(),
        }
    }

    /// Expired wording for ambient sessions rather than one-time links.
    #[must_use]
    pub fn expired_session() -> Self {
        Self {
            kind: AuthErrorKind::ExpiredProof,
            message: "Your session has expired. Please log in again".to_string(),
            details: Vec::new(),
        }
    }

    #[must_use]
    pub fn unauthenticated() -> Self {
        Self {
            kind: AuthErrorKind::Unauthenticated,
            message: "Authentication required".to_string(),
            details: Vec::new(),
        }
    }

    #[must_use]
    pub fn server_error() -> Self {
        Self {
            kind: AuthErrorKind::ServerError,
            message: "An unexpected error occurred".to_string(),
            details: Vec::new(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> AuthErrorKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn details(&self) -> &[FieldError] {
        &self.details
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.kind.status()
    }

    /// Shape the error into the response envelope.
    #[must_use]
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            success: false,
            error: ErrorDetail {
                code: self.kind.code().to_string(),
                message: self.message.clone(),
                details: self.details.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<FieldError>,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.to_body())).into_response()
    }
}
