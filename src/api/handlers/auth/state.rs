//! Auth configuration and shared request state.

use std::sync::Arc;
use std::time::Duration;

use super::provider::IdentityProvider;
use super::resolver::CredentialResolver;
use super::routes::RouteClassifier;
use super::session::SessionManager;

const DEFAULT_REDIRECT: &str = "/dashboard";
const DEFAULT_EXPIRING_SOON_SECONDS: u64 = 5 * 60;
const LOGIN_PATH: &str = "/login";

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    default_redirect: String,
    expiring_soon: Duration,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String) -> Self {
        Self {
            frontend_base_url,
            default_redirect: DEFAULT_REDIRECT.to_string(),
            expiring_soon: Duration::from_secs(DEFAULT_EXPIRING_SOON_SECONDS),
        }
    }

    #[must_use]
    pub fn with_default_redirect(mut self, path: String) -> Self {
        self.default_redirect = path;
        self
    }

    #[must_use]
    pub fn with_expiring_soon_seconds(mut self, seconds: u64) -> Self {
        self.expiring_soon = Duration::from_secs(seconds);
        self
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub fn default_redirect(&self) -> &str {
        &self.default_redirect
    }

    #[must_use]
    pub const fn expiring_soon(&self) -> Duration {
        self.expiring_soon
    }

    #[must_use]
    pub const fn login_path(&self) -> &'static str {
        LOGIN_PATH
    }

    /// Only mark cookies secure when the frontend is served over HTTPS.
    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.frontend_base_url.starts_with("https://")
    }
}

pub struct AuthState {
    config: AuthConfig,
    routes: RouteClassifier,
    provider: Arc<dyn IdentityProvider>,
    sessions: SessionManager,
    resolver: CredentialResolver,
}

impl AuthState {
    #[must_use]
    pub fn new(
        config: AuthConfig,
        routes: RouteClassifier,
        provider: Arc<dyn IdentityProvider>,
    ) -> Self {
        let sessions = SessionManager::new(provider.clone(), config.expiring_soon());
        let resolver = CredentialResolver::new(provider.clone());
        Self {
            config,
            routes,
            provider,
            sessions,
            resolver,
        }
    }

    #[must_use]
    pub fn provider(&self) -> &dyn IdentityProvider {
        self.provider.as_ref()
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn routes(&self) -> &RouteClassifier {
        &self.routes
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    #[must_use]
    pub fn resolver(&self) -> &CredentialResolver {
        &self.resolver
    }
}
