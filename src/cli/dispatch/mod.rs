//! Command-line argument dispatch and server initialization.
//!
//! This module parses validated CLI arguments and maps them to the appropriate
//! action, such as starting the API server with its full configuration state.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{self, auth};
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches
        .get_one::<u16>(commands::ARG_PORT)
        .copied()
        .unwrap_or(8080);
    let provider_url = matches
        .get_one::<String>(commands::ARG_PROVIDER_URL)
        .cloned()
        .context("missing required argument: --provider-url")?;
    let provider_key = matches
        .get_one::<String>(commands::ARG_PROVIDER_KEY)
        .cloned()
        .context("missing required argument: --provider-key")?;

    commands::validate(matches).map_err(|e| anyhow::anyhow!(e))?;

    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        provider_url,
        provider_key,
        frontend_base_url: auth_opts.frontend_base_url,
        default_redirect: auth_opts.default_redirect,
        protected_prefixes: auth_opts.protected_prefixes,
        public_prefixes: auth_opts.public_prefixes,
        expiring_soon_seconds: auth_opts.expiring_soon_seconds,
    }))
}
