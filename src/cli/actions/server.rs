use crate::api;
use crate::api::handlers::auth::{AuthConfig, AuthState, HttpIdentityProvider, RouteClassifier};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::sync::Arc;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub provider_url: String,
    pub provider_key: String,
    pub frontend_base_url: String,
    pub default_redirect: String,
    pub protected_prefixes: Vec<String>,
    pub public_prefixes: Vec<String>,
    pub expiring_soon_seconds: u64,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the route configuration is invalid, the provider
/// client cannot be built, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let config = AuthConfig::new(args.frontend_base_url)
        .with_default_redirect(args.default_redirect)
        .with_expiring_soon_seconds(args.expiring_soon_seconds);

    // Overlapping protected/public prefixes are a configuration bug; refuse to start.
    let classifier = RouteClassifier::new(args.protected_prefixes, args.public_prefixes)
        .context("invalid route prefix configuration")?;

    let provider =
        HttpIdentityProvider::new(args.provider_url, SecretString::from(args.provider_key))
            .context("Failed to build identity provider client")?;

    let state = Arc::new(AuthState::new(config, classifier, Arc::new(provider)));

    api::new(args.port, state).await
}
