//! Identity provider client.
//!
//! The provider owns credential storage, token issuance, and email delivery;
//! this client only invokes its primitives and maps the wire payloads into
//! crate types. Raw provider error text stays server-side in the logs; the
//! flows re-classify it through the error taxonomy before responding.

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use super::session::{Principal, Session, now_unix};

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The request never completed (network, TLS, timeout).
    #[error("provider request failed: {0}")]
    Transport(String),
    /// The provider answered with a non-success status.
    #[error("provider rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    /// A success response that should carry a session did not.
    #[error("provider returned no session")]
    MissingSession,
    /// A response body this client could not interpret.
    #[error("provider returned a malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl ProviderError {
    /// The provider-facing failure text, used for expired-vs-invalid
    /// classification and for logging.
    #[must_use]
    pub fn detail(&self) -> String {
        self.to_string()
    }
}

/// Whether account creation found an existing account.
///
/// Flows must not let this distinction reach the response; it exists so the
/// client can keep "already registered" out of the error path entirely.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignupOutcome {
    Created,
    AlreadyRegistered,
}

/// The provider primitives this core orchestrates.
///
/// Injected as `Arc<dyn IdentityProvider>` so tests supply deterministic
/// implementations; nothing reads a process-wide client.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange a one-time authorization code for a session.
    async fn exchange_code(&self, code: &str) -> Result<Session, ProviderError>;

    /// Exchange a one-time email verification token for a session.
    async fn verify_email_token(&self, token_hash: &str) -> Result<Session, ProviderError>;

    /// Exchange a refresh credential for a fresh session.
    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, ProviderError>;

    /// Set a new password for the authenticated principal.
    async fn update_password(
        &self,
        access_token: &str,
        new_password: &str,
    ) -> Result<(), ProviderError>;

    /// Invalidate the session behind the access credential.
    async fn sign_out(&self, access_token: &str) -> Result<(), ProviderError>;

    /// Create an account, or report that one already exists.
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignupOutcome, ProviderError>;
}

/// HTTP client for the hosted identity provider's REST surface.
pub struct HttpIdentityProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

#[derive(Deserialize)]
struct SessionPayload {
    access_token: String,
    refresh_token: String,
    expires_at: Option<i64>,
    expires_in: Option<i64>,
    user: UserPayload,
}

#[derive(Deserialize)]
struct UserPayload {
    id: String,
    email: Option<String>,
}

#[derive(Default, Deserialize)]
struct ErrorPayload {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl HttpIdentityProvider {
    /// Build the client.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(base_url: String, api_key: SecretString) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1{path}", self.base_url)
    }

    async fn session_from_response(
        response: reqwest::Response,
    ) -> Result<Session, ProviderError> {
        let status = response.status();
        if !status.is_success() {
            return Err(rejection(status, response).await);
        }
        let payload: SessionPayload = response
            .json()
            .await
            .map_err(|err| ProviderError::Malformed(err.to_string()))?;
        payload.into_session()
    }
}

impl SessionPayload {
    fn into_session(self) -> Result<Session, ProviderError> {
        if self.access_token.is_empty() || self.refresh_token.is_empty() {
            return Err(ProviderError::MissingSession);
        }
        let id = Uuid::parse_str(&self.user.id)
            .map_err(|_| ProviderError::Malformed("non-UUID user id".to_string()))?;
        let expires_at_unix = self
            .expires_at
            .or_else(|| self.expires_in.map(|ttl| now_unix() + ttl));
        Ok(Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at_unix,
            principal: Principal {
                id,
                email: self.user.email.unwrap_or_default(),
            },
        })
    }
}

async fn rejection(status: StatusCode, response: reqwest::Response) -> ProviderError {
    let payload: ErrorPayload = response.json().await.unwrap_or_default();
    let message = payload
        .error_description
        .or(payload.msg)
        .or(payload.message)
        .or(payload.error)
        .unwrap_or_else(|| "request rejected".to_string());
    debug!(status = %status, "provider rejection: {message}");
    ProviderError::Rejected {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn exchange_code(&self, code: &str) -> Result<Session, ProviderError> {
        let response = self
            .http
            .post(self.endpoint("/token?grant_type=pkce"))
            .header("apikey", self.api_key.expose_secret())
            .json(&json!({ "auth_code": code }))
            .send()
            .await?;
        Self::session_from_response(response).await
    }

    async fn verify_email_token(&self, token_hash: &str) -> Result<Session, ProviderError> {
        let response = self
            .http
            .post(self.endpoint("/verify"))
            .header("apikey", self.api_key.expose_secret())
            .json(&json!({ "type": "email", "token_hash": token_hash }))
            .send()
            .await?;
        Self::session_from_response(response).await
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, ProviderError> {
        let response = self
            .http
            .post(self.endpoint("/token?grant_type=refresh_token"))
            .header("apikey", self.api_key.expose_secret())
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await?;
        Self::session_from_response(response).await
    }

    async fn update_password(
        &self,
        access_token: &str,
        new_password: &str,
    ) -> Result<(), ProviderError> {
        let response = self
            .http
            .put(self.endpoint("/user"))
            .header("apikey", self.api_key.expose_secret())
            .bearer_auth(access_token)
            .json(&json!({ "password": new_password }))
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(rejection(status, response).await)
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), ProviderError> {
        let response = self
            .http
            .post(self.endpoint("/logout"))
            .header("apikey", self.api_key.expose_secret())
            .bearer_auth(access_token)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(rejection(status, response).await)
        }
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignupOutcome, ProviderError> {
        let response = self
            .http
            .post(self.endpoint("/signup"))
            .header("apikey", self.api_key.expose_secret())
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(SignupOutcome::Created);
        }
        let err = rejection(status, response).await;
        if let ProviderError::Rejected { ref message, .. } = err {
            // Some provider configurations reject duplicates instead of
            // obfuscating them; fold that branch back into a non-error so the
            // flow cannot leak it.
            let lowered = message.to_lowercase();
            if lowered.contains("already registered") || lowered.contains("already exists") {
                return Ok(SignupOutcome::AlreadyRegistered);
            }
        }
        Err(err)
    }
}
