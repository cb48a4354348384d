//! # Listguard (Authentication & Session Core)
//!
//! `listguard` is the authentication and session core for the Listly
//! list-curation app. It orchestrates a hosted identity provider: it never
//! stores credentials itself, it only exchanges proofs for sessions and
//! shapes the results.
//!
//! ## Credential resolution
//!
//! Sensitive operations (password reset, email confirmation) accept up to
//! three proofs: a one-time authorization `code`, a one-time email
//! verification `token_hash`, or the ambient session cookie. The resolver
//! picks exactly one by fixed priority and performs at most one provider
//! exchange per request; a failed high-priority proof is never silently
//! downgraded to a lower-priority one.
//!
//! ## Enumeration protection
//!
//! Signup returns the identical response whether or not the account already
//! exists, and proof failures collapse to a closed error taxonomy that never
//! reveals which internal branch was taken. Raw provider error text is
//! logged server-side only.
//!
//! ## Route gating
//!
//! Paths are classified against disjoint protected/public prefix lists.
//! Requests to protected paths without a valid session are redirected to the
//! login page with a sanitized return path; redirect targets are validated
//! to same-origin absolute paths to prevent open redirects.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
