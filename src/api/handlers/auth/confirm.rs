//! Email link confirmation endpoint.
//!
//! The target of verification and recovery links sent by the provider. The
//! request may carry an authorization code or a verification token (or an
//! existing session, for idempotent re-clicks); the resolver picks one, the
//! resulting session is written to the cookie, and the browser is sent to a
//! sanitized same-origin path.

use axum::{
    extract::{Extension, Query},
    http::{HeaderMap, header::SET_COOKIE},
    response::{IntoResponse, Redirect},
};
use std::sync::Arc;

use super::redirect::sanitize_redirect;
use super::resolver::CredentialProofs;
use super::session::{extract_session, session_cookie};
use super::state::AuthState;
use super::types::ConfirmQuery;

/// Exchange a one-time link proof for a session and redirect.
#[utoipa::path(
    get,
    path = "/v1/auth/confirm",
    params(ConfirmQuery),
    responses(
        (status = 303, description = "Proof accepted; redirected to the sanitized target, or to login with a generic error code")
    ),
    tag = "auth"
)]
pub async fn confirm(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    Query(query): Query<ConfirmQuery>,
) -> impl IntoResponse {
    let proofs = CredentialProofs::new(query.code, query.token_hash, query.otp_type);
    let probe = || async { extract_session(&headers) };

    match auth_state.resolver().resolve(&proofs, probe).await {
        Ok(context) => {
            let target = sanitize_redirect(
                query.redirect_to.as_deref(),
                auth_state.config().default_redirect(),
            );
            let mut response_headers = HeaderMap::new();
            if let Ok(cookie) =
                session_cookie(&context.session, auth_state.config().cookie_secure())
            {
                response_headers.insert(SET_COOKIE, cookie);
            }
            (response_headers, Redirect::to(&target)).into_response()
        }
        Err(err) => {
            // The code is the taxonomy's public shape; nothing finer leaks.
            let location = format!(
                "{}?error={}",
                auth_state.config().login_path(),
                err.kind().code()
            );
            Redirect::to(&location).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::provider::test_support::MockProvider;
    use crate::api::handlers::auth::routes::RouteClassifier;
    use crate::api::handlers::auth::state::AuthConfig;
    use axum::http::{StatusCode, header::LOCATION};

    fn auth_state(provider: Arc<MockProvider>) -> Arc<AuthState> {
        Arc::new(AuthState::new(
            AuthConfig::new("https://listly.dev".to_string()),
            RouteClassifier::new(vec![], vec![]).expect("empty prefixes"),
            provider,
        ))
    }

    fn location(response: &axum::response::Response) -> String {
        response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    #[tokio::test]
    async fn code_exchange_sets_cookie_and_redirects() {
        let state = auth_state(Arc::new(MockProvider::new()));
        let query = ConfirmQuery {
            code: Some("abc".to_string()),
            redirect_to: Some("/dashboard/my-lists".to_string()),
            ..ConfirmQuery::default()
        };
        let response = confirm(HeaderMap::new(), Extension(state), Query(query))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/dashboard/my-lists");
        assert!(response.headers().contains_key(SET_COOKIE));
    }

    #[tokio::test]
    async fn hostile_redirect_falls_back_to_default() {
        let state = auth_state(Arc::new(MockProvider::new()));
        let query = ConfirmQuery {
            code: Some("abc".to_string()),
            redirect_to: Some("//evil.com".to_string()),
            ..ConfirmQuery::default()
        };
        let response = confirm(HeaderMap::new(), Extension(state), Query(query))
            .await
            .into_response();
        assert_eq!(location(&response), "/dashboard");
    }

    #[tokio::test]
    async fn failed_proof_redirects_to_login() {
        let provider = Arc::new(MockProvider::new().with_exchange_failure("link expired"));
        let state = auth_state(provider.clone());
        let query = ConfirmQuery {
            code: Some("abc".to_string()),
            token_hash: Some("hash".to_string()),
            otp_type: Some("email".to_string()),
            redirect_to: None,
        };
        let response = confirm(HeaderMap::new(), Extension(state), Query(query))
            .await
            .into_response();
        assert_eq!(location(&response), "/login?error=expired_proof");
        assert!(!response.headers().contains_key(SET_COOKIE));
        // The lower-priority token was never tried.
        assert_eq!(provider.calls(), vec!["exchange_code"]);
    }

    #[tokio::test]
    async fn no_proofs_redirects_unauthenticated() {
        let state = auth_state(Arc::new(MockProvider::new()));
        let response = confirm(
            HeaderMap::new(),
            Extension(state),
            Query(ConfirmQuery::default()),
        )
        .await
        .into_response();
        assert_eq!(location(&response), "/login?error=unauthenticated");
    }
}
