//! Open-redirect prevention for `redirect_to` inputs.

/// Validate an untrusted redirect target, falling back to `default`.
///
/// Accepted targets are same-origin absolute paths: they start with exactly
/// one `/`. Anything else (empty input, `//host` protocol-relative escapes,
/// absolute URLs with a scheme, relative paths) maps to the default.
/// Accepted input is returned unchanged; no normalization is attempted since
/// only same-origin paths get through.
#[must_use]
pub fn sanitize_redirect(candidate: Option<&str>, default: &str) -> String {
    let Some(candidate) = candidate else {
        return default.to_string();
    };
    if candidate.is_empty() {
        return default.to_string();
    }
    if !candidate.starts_with('/') || candidate.starts_with("//") {
        return default.to_string();
    }
    // Backslashes are treated as slashes by some browsers; "/\evil.com" would
    // escape the origin just like "//evil.com".
    if candidate.starts_with("/\\") {
        return default.to_string();
    }
    candidate.to_string()
}

#[cfg(test)]
mod tests {
    use super::sanitize_redirect;

    const DEFAULT: &str = "/dashboard";

    #[test]
    fn missing_or_empty_falls_back() {
        assert_eq!(sanitize_redirect(None, DEFAULT), DEFAULT);
        assert_eq!(sanitize_redirect(Some(""), DEFAULT), DEFAULT);
    }

    #[test]
    fn protocol_relative_and_absolute_urls_rejected() {
        assert_eq!(sanitize_redirect(Some("//evil.com"), DEFAULT), DEFAULT);
        assert_eq!(
            sanitize_redirect(Some("https://evil.com"), DEFAULT),
            DEFAULT
        );
        assert_eq!(sanitize_redirect(Some("http://evil.com"), DEFAULT), DEFAULT);
        assert_eq!(
            sanitize_redirect(Some("javascript:alert(1)"), DEFAULT),
            DEFAULT
        );
        assert_eq!(sanitize_redirect(Some("/\\evil.com"), DEFAULT), DEFAULT);
    }

    #[test]
    fn relative_paths_rejected() {
        assert_eq!(sanitize_redirect(Some("dashboard"), DEFAULT), DEFAULT);
        assert_eq!(sanitize_redirect(Some("../admin"), DEFAULT), DEFAULT);
    }

    #[test]
    fn same_origin_paths_pass_unchanged() {
        assert_eq!(
            sanitize_redirect(Some("/dashboard/x"), DEFAULT),
            "/dashboard/x"
        );
        assert_eq!(
            sanitize_redirect(Some("/lists/42?tab=places"), DEFAULT),
            "/lists/42?tab=places"
        );
    }
}
