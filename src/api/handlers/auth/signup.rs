//! Signup flow with enumeration-safe responses.

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use regex::Regex;
use std::sync::Arc;
use tracing::error;

use super::error::{AuthError, FieldError};
use super::password::validate_password;
use super::state::AuthState;
use super::types::{MessageResponse, SignupRequest};

// Deliberately identical for fresh and pre-existing accounts; the provider
// decides which email to send, and nothing in the response reflects it.
const SIGNUP_MESSAGE: &str = "Check your email to confirm your account";

/// Normalize an email for the provider call.
pub(super) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
pub(super) fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

fn validate_signup_input(email: &str, request: &SignupRequest) -> Vec<FieldError> {
    let mut details = Vec::new();
    if !valid_email(email) {
        details.push(FieldError::new("email", "must be a valid email address"));
    }
    details.extend(validate_password(&request.password));
    if let Some(confirm) = &request.confirm_password {
        if confirm != &request.password {
            details.push(FieldError::new("confirm_password", "passwords do not match"));
        }
    }
    details
}

/// Run the signup flow.
///
/// Whether the provider created an account or found an existing one, the
/// returned response is the same value; account existence never shapes the
/// body, the status, or (beyond the provider round-trip itself) the timing.
///
/// # Errors
/// Validation failures return field detail; provider failures that are not
/// the duplicate-account case map to a generic server error.
pub(crate) async fn execute_signup(
    state: &AuthState,
    request: &SignupRequest,
) -> Result<MessageResponse, AuthError> {
    let email = normalize_email(&request.email);
    let details = validate_signup_input(&email, request);
    if !details.is_empty() {
        return Err(AuthError::validation(details));
    }

    match state.provider().sign_up(&email, &request.password).await {
        Ok(_outcome) => Ok(MessageResponse::new(SIGNUP_MESSAGE)),
        Err(err) => {
            error!("Signup failed: {err}");
            Err(AuthError::server_error())
        }
    }
}

/// Create an account and trigger the confirmation email.
#[utoipa::path(
    post,
    path = "/v1/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Signup accepted", body = MessageResponse),
        (status = 400, description = "Validation failure", body = super::error::ErrorBody)
    ),
    tag = "auth"
)]
pub async fn signup(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<SignupRequest>>,
) -> impl IntoResponse {
    let request: SignupRequest = match payload {
        Some(Json(payload)) => payload,
        None => {
            return AuthError::validation(vec![FieldError::new("body", "missing payload")])
                .into_response();
        }
    };

    match execute_signup(&auth_state, &request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => err.into_response(),
    }
}
