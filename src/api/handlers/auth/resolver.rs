//! Credential resolution for proof-bearing endpoints.
//!
//! A request may carry up to three proofs: a one-time authorization code, a
//! one-time email verification token, or the ambient session. Exactly one is
//! selected by fixed priority and exchanged; a failed high-priority proof is
//! reported as a failure, never silently downgraded to a lower-priority one.
//! Mixing proofs would let a stale high-priority proof mask a valid
//! low-priority one (or the reverse), so the resolver performs at most one
//! provider exchange per request.

use std::future::Future;
use std::sync::Arc;
use tracing::error;

use super::error::AuthError;
use super::provider::{IdentityProvider, ProviderError};
use super::session::{Session, is_expired_at, now_unix};

/// The proofs a request supplied, already normalized: empty and
/// whitespace-only values count as absent.
#[derive(Clone, Debug, Default)]
pub struct CredentialProofs {
    code: Option<String>,
    token_hash: Option<String>,
    otp_type: Option<String>,
}

impl CredentialProofs {
    #[must_use]
    pub fn new(
        code: Option<String>,
        token_hash: Option<String>,
        otp_type: Option<String>,
    ) -> Self {
        Self {
            code: normalize(code),
            token_hash: normalize(token_hash),
            otp_type: normalize(otp_type),
        }
    }

    #[must_use]
    pub fn code(code: &str) -> Self {
        Self::new(Some(code.to_string()), None, None)
    }

    #[must_use]
    pub fn email_token(token_hash: &str) -> Self {
        Self::new(
            None,
            Some(token_hash.to_string()),
            Some("email".to_string()),
        )
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A successfully resolved authentication.
#[derive(Clone, Debug)]
pub struct AuthenticatedContext {
    pub session: Session,
}

/// Classify a failed proof exchange as expired or invalid.
///
/// The provider exposes no machine-readable code for this distinction, so
/// this is a best-effort substring rule over its error text: wording that
/// mentions "expired" maps to the expired kind, everything else to invalid.
/// If the provider ever changes wording, classification degrades to
/// "invalid", which is already safe to expose; this is a UX hint, not a
/// security boundary.
#[must_use]
pub fn classify_exchange_error(err: &ProviderError) -> AuthError {
    if err.detail().to_lowercase().contains("expired") {
        AuthError::expired_proof()
    } else {
        AuthError::invalid_proof()
    }
}

/// Selects and exchanges exactly one credential proof per request.
#[derive(Clone)]
pub struct CredentialResolver {
    provider: Arc<dyn IdentityProvider>,
}

impl CredentialResolver {
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    /// Resolve the authoritative proof.
    ///
    /// Priority: authorization code, then email verification token, then the
    /// ambient session supplied by `probe`. The probe is only invoked when no
    /// one-time proof is present, and never after a failed exchange.
    ///
    /// # Errors
    /// Returns the classified exchange failure for the selected proof, or
    /// [`AuthError::unauthenticated`] when no usable proof exists.
    pub async fn resolve<F, Fut>(
        &self,
        proofs: &CredentialProofs,
        probe: F,
    ) -> Result<AuthenticatedContext, AuthError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<Session>>,
    {
        if let Some(code) = proofs.code.as_deref() {
            return match self.provider.exchange_code(code).await {
                Ok(session) => Ok(AuthenticatedContext { session }),
                Err(err) => {
                    error!("Authorization code exchange failed: {err}");
                    Err(classify_exchange_error(&err))
                }
            };
        }

        if let Some(token_hash) = proofs.token_hash.as_deref() {
            if proofs.otp_type.as_deref() == Some("email") {
                return match self.provider.verify_email_token(token_hash).await {
                    Ok(session) => Ok(AuthenticatedContext { session }),
                    Err(err) => {
                        error!("Verification token exchange failed: {err}");
                        Err(classify_exchange_error(&err))
                    }
                };
            }
        }

        match probe().await {
            Some(session) if !is_expired_at(Some(&session), now_unix()) => {
                Ok(AuthenticatedContext { session })
            }
            _ => Err(AuthError::unauthenticated()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::error::AuthErrorKind;
    use crate::api::handlers::auth::provider::test_support::MockProvider;

    fn resolver(provider: &Arc<MockProvider>) -> CredentialResolver {
        CredentialResolver::new(provider.clone())
    }

    async fn no_session() -> Option<Session> {
        None
    }

    #[tokio::test]
    async fn code_wins_over_token_and_session() {
        let provider = Arc::new(MockProvider::new());
        let proofs = CredentialProofs::new(
            Some("abc".to_string()),
            Some("hash".to_string()),
            Some("email".to_string()),
        );
        let context = resolver(&provider)
            .resolve(&proofs, || async { Some(MockProvider::session()) })
            .await
            .expect("code exchange succeeds");
        assert_eq!(context.session.access_token, "mock-access");
        // The token-verify primitive and the probe were never consulted.
        assert_eq!(provider.calls(), vec!["exchange_code"]);
    }

    #[tokio::test]
    async fn failed_code_does_not_fall_through() {
        let provider = Arc::new(MockProvider::new().with_exchange_failure("code not found"));
        let proofs = CredentialProofs::new(
            Some("abc".to_string()),
            Some("hash".to_string()),
            Some("email".to_string()),
        );
        let err = resolver(&provider)
            .resolve(&proofs, || async { Some(MockProvider::session()) })
            .await
            .expect_err("failure must propagate");
        assert_eq!(err.kind(), AuthErrorKind::InvalidProof);
        assert_eq!(provider.calls(), vec!["exchange_code"]);
    }

    #[tokio::test]
    async fn expired_code_classified_as_expired() {
        let provider =
            Arc::new(MockProvider::new().with_exchange_failure("Email link has expired"));
        let err = resolver(&provider)
            .resolve(&CredentialProofs::code("abc"), || no_session())
            .await
            .expect_err("expired");
        assert_eq!(err.kind(), AuthErrorKind::ExpiredProof);
        assert!(err.message().contains("expired"));
    }

    #[tokio::test]
    async fn email_token_used_when_no_code() {
        let provider = Arc::new(MockProvider::new());
        let context = resolver(&provider)
            .resolve(&CredentialProofs::email_token("hash"), || no_session())
            .await
            .expect("token exchange succeeds");
        assert_eq!(context.session.refresh_token, "mock-refresh");
        assert_eq!(provider.calls(), vec!["verify_email_token"]);
    }

    #[tokio::test]
    async fn failed_token_does_not_fall_through_to_probe() {
        let provider = Arc::new(MockProvider::new().with_verify_failure("token not found"));
        let err = resolver(&provider)
            .resolve(&CredentialProofs::email_token("hash"), || async {
                Some(MockProvider::session())
            })
            .await
            .expect_err("failure must propagate");
        assert_eq!(err.kind(), AuthErrorKind::InvalidProof);
        assert_eq!(provider.calls(), vec!["verify_email_token"]);
    }

    #[tokio::test]
    async fn token_without_email_type_is_ignored() {
        let provider = Arc::new(MockProvider::new());
        let proofs = CredentialProofs::new(None, Some("hash".to_string()), None);
        let err = resolver(&provider)
            .resolve(&proofs, || no_session())
            .await
            .expect_err("no usable proof");
        assert_eq!(err.kind(), AuthErrorKind::Unauthenticated);
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn ambient_session_is_last_resort() {
        let provider = Arc::new(MockProvider::new());
        let context = resolver(&provider)
            .resolve(&CredentialProofs::default(), || async {
                Some(MockProvider::session())
            })
            .await
            .expect("ambient session accepted");
        assert_eq!(context.session.access_token, "mock-access");
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn expired_ambient_session_rejected() {
        let provider = Arc::new(MockProvider::new());
        let err = resolver(&provider)
            .resolve(&CredentialProofs::default(), || async {
                let mut session = MockProvider::session();
                session.expires_at_unix = Some(now_unix());
                Some(session)
            })
            .await
            .expect_err("expired ambient session");
        assert_eq!(err.kind(), AuthErrorKind::Unauthenticated);
    }

    #[tokio::test]
    async fn no_proofs_at_all() {
        let provider = Arc::new(MockProvider::new());
        let err = resolver(&provider)
            .resolve(&CredentialProofs::default(), || no_session())
            .await
            .expect_err("nothing to resolve");
        assert_eq!(err.kind(), AuthErrorKind::Unauthenticated);
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn blank_proofs_count_as_absent() {
        let provider = Arc::new(MockProvider::new());
        let proofs = CredentialProofs::new(Some("  ".to_string()), Some(String::new()), None);
        let err = resolver(&provider)
            .resolve(&proofs, || no_session())
            .await
            .expect_err("blank proofs");
        assert_eq!(err.kind(), AuthErrorKind::Unauthenticated);
        assert!(provider.calls().is_empty());
    }

    #[test]
    fn classification_rule_is_substring_based() {
        let expired = ProviderError::Rejected {
            status: 400,
            message: "Token has EXPIRED".to_string(),
        };
        assert_eq!(
            classify_exchange_error(&expired).kind(),
            AuthErrorKind::ExpiredProof
        );

        let invalid = ProviderError::Rejected {
            status: 400,
            message: "Token not found".to_string(),
        };
        assert_eq!(
            classify_exchange_error(&invalid).kind(),
            AuthErrorKind::InvalidProof
        );
    }
}
