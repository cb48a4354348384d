pub mod auth;
pub mod logging;

use clap::{
    Arg, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

pub const ARG_PORT: &str = "port";
pub const ARG_PROVIDER_URL: &str = "provider-url";
pub const ARG_PROVIDER_KEY: &str = "provider-key";

/// Validate that the provider URL looks like an HTTP(S) endpoint.
///
/// # Errors
/// Returns an error string if the URL carries an unsupported scheme.
pub fn validate(matches: &clap::ArgMatches) -> Result<(), String> {
    let Some(url) = matches.get_one::<String>(ARG_PROVIDER_URL) else {
        return Ok(()); // Should be handled by required=true in clap
    };

    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(format!(
            "--{ARG_PROVIDER_URL} must be an http:// or https:// URL"
        ));
    }
    Ok(())
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("listguard")
        .about("Authentication and session core for Listly")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("8080")
                .env("LISTGUARD_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_PROVIDER_URL)
                .long(ARG_PROVIDER_URL)
                .help("Identity provider base URL")
                .env("LISTGUARD_PROVIDER_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_PROVIDER_KEY)
                .long(ARG_PROVIDER_KEY)
                .help("Identity provider API key")
                .env("LISTGUARD_PROVIDER_KEY")
                .required(true),
        );

    let command = auth::with_args(command);
    logging::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Vec<&'static str> {
        vec![
            "listguard",
            "--provider-url",
            "https://auth.listly.dev",
            "--provider-key",
            "service-key",
        ]
    }

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "listguard");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Authentication and session core for Listly".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_defaults() {
        temp_env::with_vars_unset(
            [
                "LISTGUARD_PORT",
                "LISTGUARD_FRONTEND_BASE_URL",
                "LISTGUARD_DEFAULT_REDIRECT",
                "LISTGUARD_PROTECTED_PREFIXES",
                "LISTGUARD_PUBLIC_PREFIXES",
            ],
            || {
                let matches = new().get_matches_from(base_args());

                assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(8080));
                assert_eq!(
                    matches
                        .get_one::<String>(auth::ARG_DEFAULT_REDIRECT)
                        .map(String::as_str),
                    Some("/dashboard")
                );
                assert_eq!(
                    matches
                        .get_one::<String>(auth::ARG_PROTECTED_PREFIXES)
                        .map(String::as_str),
                    Some("/dashboard,/account")
                );
            },
        );
    }

    #[test]
    fn test_validate_rejects_non_http_provider() {
        let matches = new().get_matches_from(vec![
            "listguard",
            "--provider-url",
            "ftp://auth.listly.dev",
            "--provider-key",
            "service-key",
        ]);
        assert!(validate(&matches).is_err());

        let matches = new().get_matches_from(base_args());
        assert!(validate(&matches).is_ok());
    }

    #[test]
    fn test_provider_url_required() {
        temp_env::with_vars_unset(["LISTGUARD_PROVIDER_URL", "LISTGUARD_PROVIDER_KEY"], || {
            let result = new().try_get_matches_from(vec!["listguard"]);
            assert!(result.is_err());
        });
    }

    #[test]
    fn test_env_overrides() {
        temp_env::with_vars(
            [
                ("LISTGUARD_PORT", Some("9090")),
                ("LISTGUARD_SESSION_EXPIRING_SOON_SECONDS", Some("60")),
            ],
            || {
                let matches = new().get_matches_from(base_args());
                assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(9090));
                assert_eq!(
                    matches
                        .get_one::<u64>(auth::ARG_EXPIRING_SOON_SECONDS)
                        .copied(),
                    Some(60)
                );
            },
        );
    }
}
