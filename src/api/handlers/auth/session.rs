//! Session model, expiry math, and the session manager.
//!
//! A session is read-only to this crate: the identity provider creates it on
//! a successful exchange and owns its storage. Here we only derive validity,
//! carry it across requests in an `HttpOnly` cookie, and trigger the
//! provider's refresh/sign-out primitives.

use axum::{
    Json,
    extract::Extension,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{AUTHORIZATION, InvalidHeaderValue, SET_COOKIE},
    },
    response::IntoResponse,
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::AuthError;
use super::provider::IdentityProvider;
use super::state::AuthState;
use super::types::SessionResponse;

pub(crate) const SESSION_COOKIE_NAME: &str = "listguard_session";

/// Default "expiring soon" threshold.
pub const DEFAULT_EXPIRING_SOON: Duration = Duration::from_secs(5 * 60);

/// The principal a session belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
}

/// An authenticated context issued by the identity provider.
///
/// Either fully present or absent: code handling sessions passes
/// `Option<Session>` around, never a partially filled struct. A session the
/// provider issued without an expiry is treated as already expired.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at_unix: Option<i64>,
    pub principal: Principal,
}

/// Derived view of a session, safe to hand to callers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct SessionInfo {
    pub is_valid: bool,
    pub principal: Option<Principal>,
    pub expires_at_unix: Option<i64>,
    pub is_expiring_soon: bool,
}

pub(crate) fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs() as i64)
}

/// A session whose expiry equals `now` exactly is already expired.
#[must_use]
pub fn is_expired_at(session: Option<&Session>, now: i64) -> bool {
    match session {
        None => true,
        Some(session) => match session.expires_at_unix {
            None => true,
            Some(expires_at) => expires_at <= now,
        },
    }
}

/// Seconds left before expiry, clamped at zero.
#[must_use]
pub fn time_remaining_at(session: Option<&Session>, now: i64) -> Duration {
    let Some(session) = session else {
        return Duration::ZERO;
    };
    let Some(expires_at) = session.expires_at_unix else {
        return Duration::ZERO;
    };
    if expires_at <= now {
        return Duration::ZERO;
    }
    Duration::from_secs((expires_at - now) as u64)
}

/// True iff the session is still valid and within `threshold` of expiry.
#[must_use]
pub fn is_expiring_soon_at(session: Option<&Session>, now: i64, threshold: Duration) -> bool {
    !is_expired_at(session, now) && time_remaining_at(session, now) <= threshold
}

/// Pure derivation of [`SessionInfo`] at a given instant.
#[must_use]
pub fn session_info_at(session: Option<&Session>, now: i64, threshold: Duration) -> SessionInfo {
    let is_valid = !is_expired_at(session, now);
    SessionInfo {
        is_valid,
        principal: session.filter(|_| is_valid).map(|s| s.principal.clone()),
        expires_at_unix: session.and_then(|s| s.expires_at_unix),
        is_expiring_soon: is_expiring_soon_at(session, now, threshold),
    }
}

/// Wraps the provider's session primitives.
#[derive(Clone)]
pub struct SessionManager {
    provider: Arc<dyn IdentityProvider>,
    expiring_soon: Duration,
}

impl SessionManager {
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>, expiring_soon: Duration) -> Self {
        Self {
            provider,
            expiring_soon,
        }
    }

    #[must_use]
    pub fn info(&self, session: Option<&Session>) -> SessionInfo {
        session_info_at(session, now_unix(), self.expiring_soon)
    }

    #[must_use]
    pub fn is_expired(&self, session: Option<&Session>) -> bool {
        is_expired_at(session, now_unix())
    }

    #[must_use]
    pub fn time_remaining(&self, session: Option<&Session>) -> Duration {
        time_remaining_at(session, now_unix())
    }

    #[must_use]
    pub fn is_expiring_soon(&self, session: Option<&Session>) -> bool {
        is_expiring_soon_at(session, now_unix(), self.expiring_soon)
    }

    /// Exchange the refresh credential for a new session.
    ///
    /// Any provider failure, and a provider success that somehow carries no
    /// session, surface as an expired-session error. Never retried here; the
    /// caller decides whether to prompt a re-login.
    ///
    /// # Errors
    /// Returns [`AuthError::expired_session`] when no session is present or
    /// the provider refuses the refresh.
    pub async fn refresh(&self, session: Option<&Session>) -> Result<Session, AuthError> {
        let Some(session) = session else {
            return Err(AuthError::expired_session());
        };
        match self.provider.refresh_session(&session.refresh_token).await {
            Ok(refreshed) => Ok(refreshed),
            Err(err) => {
                warn!("Session refresh failed: {err}");
                Err(AuthError::expired_session())
            }
        }
    }

    /// Sign out with the provider.
    ///
    /// Failure is logged and swallowed: invalidation must never block or fail
    /// the surrounding flow, so this intentionally returns nothing.
    pub async fn invalidate(&self, session: Option<&Session>) {
        let Some(session) = session else {
            return;
        };
        if let Err(err) = self.provider.sign_out(&session.access_token).await {
            warn!("Sign-out failed, session left to expire server-side: {err}");
        }
    }
}

/// Report the ambient session's derived state.
///
/// A missing or malformed cookie is an `is_valid: false` body, never an
/// error; callers poll this to decide when to prompt a re-login.
#[utoipa::path(
    get,
    path = "/v1/auth/session",
    responses(
        (status = 200, description = "Derived session state", body = SessionResponse)
    ),
    tag = "auth"
)]
pub async fn session(headers: HeaderMap, auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    let session = extract_session(&headers);
    let info = auth_state.sessions().info(session.as_ref());
    (
        StatusCode::OK,
        Json(SessionResponse {
            success: true,
            data: info,
        }),
    )
}

/// Refresh the ambient session.
#[utoipa::path(
    post,
    path = "/v1/auth/refresh",
    responses(
        (status = 200, description = "Session refreshed", body = SessionResponse),
        (status = 400, description = "Session expired or refresh refused", body = super::error::ErrorBody)
    ),
    tag = "auth"
)]
pub async fn refresh(headers: HeaderMap, auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    let ambient = extract_session(&headers);
    match auth_state.sessions().refresh(ambient.as_ref()).await {
        Ok(refreshed) => {
            let mut response_headers = HeaderMap::new();
            if let Ok(cookie) = session_cookie(&refreshed, auth_state.config().cookie_secure()) {
                response_headers.insert(SET_COOKIE, cookie);
            }
            let info = auth_state.sessions().info(Some(&refreshed));
            (
                StatusCode::OK,
                response_headers,
                Json(SessionResponse {
                    success: true,
                    data: info,
                }),
            )
                .into_response()
        }
        Err(err) => {
            // The refresh credential is spent or stale; drop the cookie so the
            // client stops replaying it.
            let mut response_headers = HeaderMap::new();
            if let Ok(cookie) = clear_session_cookie(auth_state.config().cookie_secure()) {
                response_headers.insert(SET_COOKIE, cookie);
            }
            (err.status(), response_headers, Json(err.to_body())).into_response()
        }
    }
}

/// Sign out and clear the session cookie.
#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 204, description = "Session cleared")
    ),
    tag = "auth"
)]
pub async fn logout(headers: HeaderMap, auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    let session = extract_session(&headers);
    auth_state.sessions().invalidate(session.as_ref()).await;

    // Always clear the cookie, even when no session was attached.
    let mut response_headers = HeaderMap::new();
    if let Ok(cookie) = clear_session_cookie(auth_state.config().cookie_secure()) {
        response_headers.insert(SET_COOKIE, cookie);
    }
    (StatusCode::NO_CONTENT, response_headers)
}

// Cookie transport. The session rides an HttpOnly cookie as an opaque
// base64url JSON payload; the provider still owns the session itself.

/// Build the `Set-Cookie` value carrying the session.
pub(crate) fn session_cookie(
    session: &Session,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let payload = encode_session(session);
    let max_age = time_remaining_at(Some(session), now_unix()).as_secs();
    let mut cookie =
        format!("{SESSION_COOKIE_NAME}={payload}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(crate) fn clear_session_cookie(secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(crate) fn encode_session(session: &Session) -> String {
    // Serializing a Session cannot fail; the payload is plain strings and ints.
    let json = serde_json::to_vec(session).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

pub(crate) fn decode_session(payload: &str) -> Option<Session> {
    let bytes = URL_SAFE_NO_PAD.decode(payload.as_bytes()).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Read the ambient session from the request, cookie first, bearer fallback.
///
/// A malformed cookie is treated as "no session" rather than an error, so
/// stale clients fall through to the login redirect instead of a 500.
pub(crate) fn extract_session(headers: &HeaderMap) -> Option<Session> {
    if let Some(payload) = extract_cookie_value(headers) {
        return decode_session(&payload);
    }
    extract_bearer_payload(headers).and_then(|payload| decode_session(&payload))
}

fn extract_cookie_value(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(axum::http::header::COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == SESSION_COOKIE_NAME {
            return Some(val.to_string());
        }
    }
    None
}

fn extract_bearer_payload(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
