//! Password policy and the password reset flow.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::error;

use super::error::{AuthError, FieldError};
use super::resolver::CredentialProofs;
use super::session::{clear_session_cookie, extract_session};
use super::state::AuthState;
use super::types::{MessageResponse, ResetPasswordRequest};

pub const MIN_PASSWORD_LEN: usize = 12;

const RESET_SUCCESS_MESSAGE: &str = "Your password has been updated. Please log in again";

/// Check a candidate password against the policy.
///
/// All rules apply simultaneously; the result names every failed rule so the
/// caller can fix them in one pass. This is the one place granular detail is
/// safe to expose: it concerns the new password the user is typing, never
/// account state.
#[must_use]
pub fn validate_password(password: &str) -> Vec<FieldError> {
    let mut details = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LEN {
        details.push(FieldError::new(
            "password",
            "must be at least 12 characters",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        details.push(FieldError::new(
            "password",
            "must contain a lowercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        details.push(FieldError::new(
            "password",
            "must contain an uppercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        details.push(FieldError::new("password", "must contain a digit"));
    }
    if !password.chars().any(|c| !c.is_alphanumeric()) {
        details.push(FieldError::new("password", "must contain a symbol"));
    }
    details
}

fn validate_reset_input(password: &str, confirm_password: &str) -> Vec<FieldError> {
    let mut details = validate_password(password);
    if password != confirm_password {
        details.push(FieldError::new("confirm_password", "passwords do not match"));
    }
    details
}

/// Run the reset flow: validate, resolve a proof, update, invalidate.
///
/// Invalidation is sequenced after the update and its outcome never changes
/// the flow's result: success is reported iff the provider accepted the new
/// password.
///
/// # Errors
/// Validation failures short-circuit before any provider call; resolver
/// failures propagate unchanged; a provider-side update failure is an
/// infrastructure fault and maps to a server error.
pub(crate) async fn execute_reset<F, Fut>(
    state: &AuthState,
    request: &ResetPasswordRequest,
    probe: F,
) -> Result<MessageResponse, AuthError>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Option<super::session::Session>>,
{
    let details = validate_reset_input(&request.password, &request.confirm_password);
    if !details.is_empty() {
        return Err(AuthError::validation(details));
    }

    let proofs = CredentialProofs::new(
        request.code.clone(),
        request.token_hash.clone(),
        request.otp_type.clone(),
    );
    let context = state.resolver().resolve(&proofs, probe).await?;

    let update = state
        .provider()
        .update_password(&context.session.access_token, &request.password)
        .await;

    // The one ordering contract in this crate: sign-out runs after the update
    // and is not allowed to downgrade its result.
    state.sessions().invalidate(Some(&context.session)).await;

    match update {
        Ok(()) => Ok(MessageResponse::new(RESET_SUCCESS_MESSAGE)),
        Err(err) => {
            // Password shape is already known-good here, so this is not a
            // caller-fixable problem.
            error!("Password update failed: {err}");
            Err(AuthError::server_error())
        }
    }
}

/// Reset the password using whichever proof the request carries.
#[utoipa::path(
    post,
    path = "/v1/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Validation failure or unusable proof", body = super::error::ErrorBody),
        (status = 401, description = "No usable proof", body = super::error::ErrorBody)
    ),
    tag = "auth"
)]
pub async fn reset_password(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> impl IntoResponse {
    let request: ResetPasswordRequest = match payload {
        Some(Json(payload)) => payload,
        None => {
            return AuthError::validation(vec![FieldError::new("body", "missing payload")])
                .into_response();
        }
    };

    let probe = || async { extract_session(&headers) };
    match execute_reset(&auth_state, &request, probe).await {
        Ok(response) => {
            // The old session was just invalidated; drop the cookie with it.
            let mut response_headers = HeaderMap::new();
            if let Ok(cookie) = clear_session_cookie(auth_state.config().cookie_secure()) {
                response_headers.insert(SET_COOKIE, cookie);
            }
            (StatusCode::OK, response_headers, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}
