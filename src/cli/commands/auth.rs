use anyhow::{Context, Result};
use clap::{Arg, Command};

pub const ARG_FRONTEND_BASE_URL: &str = "frontend-base-url";
pub const ARG_DEFAULT_REDIRECT: &str = "default-redirect";
pub const ARG_PROTECTED_PREFIXES: &str = "protected-prefixes";
pub const ARG_PUBLIC_PREFIXES: &str = "public-prefixes";
pub const ARG_EXPIRING_SOON_SECONDS: &str = "session-expiring-soon-seconds";

/// Parsed auth/session arguments.
#[derive(Debug)]
pub struct Options {
    pub frontend_base_url: String,
    pub default_redirect: String,
    pub protected_prefixes: Vec<String>,
    pub public_prefixes: Vec<String>,
    pub expiring_soon_seconds: u64,
}

impl Options {
    /// Extract auth options from CLI matches.
    ///
    /// # Errors
    /// Returns an error if a required argument is missing.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let frontend_base_url = matches
            .get_one::<String>(ARG_FRONTEND_BASE_URL)
            .cloned()
            .context("missing frontend base URL")?;
        let default_redirect = matches
            .get_one::<String>(ARG_DEFAULT_REDIRECT)
            .cloned()
            .context("missing default redirect")?;
        let protected_prefixes = split_prefixes(
            matches
                .get_one::<String>(ARG_PROTECTED_PREFIXES)
                .map(String::as_str)
                .unwrap_or_default(),
        );
        let public_prefixes = split_prefixes(
            matches
                .get_one::<String>(ARG_PUBLIC_PREFIXES)
                .map(String::as_str)
                .unwrap_or_default(),
        );
        let expiring_soon_seconds = matches
            .get_one::<u64>(ARG_EXPIRING_SOON_SECONDS)
            .copied()
            .unwrap_or(300);

        Ok(Self {
            frontend_base_url,
            default_redirect,
            protected_prefixes,
            public_prefixes,
            expiring_soon_seconds,
        })
    }
}

fn split_prefixes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|prefix| !prefix.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_FRONTEND_BASE_URL)
                .long(ARG_FRONTEND_BASE_URL)
                .help("Frontend base URL, used for CORS and cookie security")
                .env("LISTGUARD_FRONTEND_BASE_URL")
                .default_value("https://listly.dev"),
        )
        .arg(
            Arg::new(ARG_DEFAULT_REDIRECT)
                .long(ARG_DEFAULT_REDIRECT)
                .help("Default post-auth redirect path, used when redirect_to is missing or unsafe")
                .env("LISTGUARD_DEFAULT_REDIRECT")
                .default_value("/dashboard"),
        )
        .arg(
            Arg::new(ARG_PROTECTED_PREFIXES)
                .long(ARG_PROTECTED_PREFIXES)
                .help("Comma-separated path prefixes that require a valid session")
                .env("LISTGUARD_PROTECTED_PREFIXES")
                .default_value("/dashboard,/account"),
        )
        .arg(
            Arg::new(ARG_PUBLIC_PREFIXES)
                .long(ARG_PUBLIC_PREFIXES)
                .help("Comma-separated path prefixes that are explicitly public")
                .env("LISTGUARD_PUBLIC_PREFIXES")
                .default_value("/,/login,/signup,/auth,/reset-password"),
        )
        .arg(
            Arg::new(ARG_EXPIRING_SOON_SECONDS)
                .long(ARG_EXPIRING_SOON_SECONDS)
                .help("Sessions with less than this many seconds left are reported as expiring soon")
                .env("LISTGUARD_SESSION_EXPIRING_SOON_SECONDS")
                .default_value("300")
                .value_parser(clap::value_parser!(u64)),
        )
}

#[cfg(test)]
mod tests {
    use super::split_prefixes;

    #[test]
    fn split_prefixes_trims_and_drops_empties() {
        assert_eq!(
            split_prefixes("/dashboard, /account ,,"),
            vec!["/dashboard".to_string(), "/account".to_string()]
        );
        assert!(split_prefixes("").is_empty());
    }
}
