//! Route classification and the request gate.
//!
//! Paths are matched against two disjoint prefix lists. A prefix matches the
//! path itself or any nested segment (`/dashboard` matches `/dashboard/x`,
//! never `/dashboardz`). Paths in neither list are not protected: every
//! protected surface must be enumerated explicitly, which is a configuration
//! discipline enforced socially, not here.

use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::debug;

use super::redirect::sanitize_redirect;
use super::session::{extract_session, is_expired_at, now_unix};
use super::state::AuthState;

#[derive(Debug, thiserror::Error)]
pub enum RouteConfigError {
    #[error("route prefix {0:?} must start with '/'")]
    InvalidPrefix(String),
    #[error("route prefix {0:?} is both protected and public")]
    Overlap(String),
}

/// Classifies request paths as protected, public, or neither.
#[derive(Clone, Debug)]
pub struct RouteClassifier {
    protected: Vec<String>,
    public: Vec<String>,
}

impl RouteClassifier {
    /// Build a classifier, validating the configuration invariant that the
    /// two prefix sets are disjoint under prefix matching.
    ///
    /// # Errors
    /// Returns an error for prefixes not starting with `/`, or when a prefix
    /// in one list would match a prefix in the other.
    pub fn new(protected: Vec<String>, public: Vec<String>) -> Result<Self, RouteConfigError> {
        let protected = normalize_prefixes(protected)?;
        let public = normalize_prefixes(public)?;

        for p in &protected {
            for q in &public {
                if prefix_matches(p, q) || prefix_matches(q, p) {
                    return Err(RouteConfigError::Overlap(q.clone()));
                }
            }
        }

        Ok(Self { protected, public })
    }

    #[must_use]
    pub fn is_protected(&self, path: &str) -> bool {
        self.protected.iter().any(|prefix| prefix_matches(prefix, path))
    }

    #[must_use]
    pub fn is_public(&self, path: &str) -> bool {
        self.public.iter().any(|prefix| prefix_matches(prefix, path))
    }
}

fn normalize_prefixes(prefixes: Vec<String>) -> Result<Vec<String>, RouteConfigError> {
    prefixes
        .into_iter()
        .map(|prefix| {
            if !prefix.starts_with('/') {
                return Err(RouteConfigError::InvalidPrefix(prefix));
            }
            // A trailing slash would break exact matching; "/" itself stays.
            if prefix.len() > 1 && prefix.ends_with('/') {
                Ok(prefix.trim_end_matches('/').to_string())
            } else {
                Ok(prefix)
            }
        })
        .collect()
}

/// Exact match or nested-segment match.
fn prefix_matches(prefix: &str, path: &str) -> bool {
    if path == prefix {
        return true;
    }
    if prefix == "/" {
        // Root only matches itself; everything nests under it otherwise.
        return false;
    }
    path.len() > prefix.len()
        && path.starts_with(prefix)
        && path.as_bytes()[prefix.len()] == b'/'
}

/// Request gate: protected paths require a valid ambient session.
///
/// Unauthenticated requests are redirected to the login page carrying the
/// original path as a sanitized return target. The decision to redirect is
/// made here, once, from the classifier's verdict; handlers never throw
/// redirects across layers.
pub async fn route_gate(
    Extension(state): Extension<Arc<AuthState>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if state.routes().is_protected(&path) {
        let session = extract_session(request.headers());
        if is_expired_at(session.as_ref(), now_unix()) {
            debug!(path = %path, "unauthenticated request to protected path");
            let target = sanitize_redirect(Some(&path), state.config().default_redirect());
            let location = format!(
                "{}?redirect_to={}",
                state.config().login_path(),
                urlencoding::encode(&target)
            );
            return Redirect::to(&location).into_response();
        }
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> RouteClassifier {
        RouteClassifier::new(
            vec!["/dashboard".to_string(), "/account".to_string()],
            vec![
                "/".to_string(),
                "/login".to_string(),
                "/signup".to_string(),
                "/auth".to_string(),
            ],
        )
        .expect("valid prefixes")
    }

    #[test]
    fn protected_matches_exact_and_nested() {
        let routes = classifier();
        assert!(routes.is_protected("/dashboard"));
        assert!(routes.is_protected("/dashboard/my-lists"));
        assert!(routes.is_protected("/account/settings"));
        assert!(!routes.is_protected("/dashboardz"));
        assert!(!routes.is_protected("/dash"));
    }

    #[test]
    fn public_matches_exact_and_nested() {
        let routes = classifier();
        assert!(routes.is_public("/"));
        assert!(routes.is_public("/login"));
        assert!(routes.is_public("/signup"));
        assert!(!routes.is_public("/loginz"));
    }

    #[test]
    fn unlisted_paths_are_neither() {
        let routes = classifier();
        assert!(!routes.is_protected("/about"));
        assert!(!routes.is_public("/about"));
    }

    #[test]
    fn root_prefix_only_matches_root() {
        let routes = classifier();
        assert!(!routes.is_public("/anything"));
    }

    #[test]
    fn overlapping_prefixes_rejected() {
        let result = RouteClassifier::new(
            vec!["/dashboard".to_string()],
            vec!["/dashboard/settings".to_string()],
        );
        assert!(matches!(result, Err(RouteConfigError::Overlap(_))));

        let result = RouteClassifier::new(
            vec!["/dashboard".to_string()],
            vec!["/dashboard".to_string()],
        );
        assert!(matches!(result, Err(RouteConfigError::Overlap(_))));
    }

    #[test]
    fn invalid_prefix_rejected() {
        let result = RouteClassifier::new(vec!["dashboard".to_string()], vec![]);
        assert!(matches!(result, Err(RouteConfigError::InvalidPrefix(_))));
    }

    #[test]
    fn trailing_slashes_normalized() {
        let routes = RouteClassifier::new(vec!["/dashboard/".to_string()], vec![])
            .expect("normalized prefix");
        assert!(routes.is_protected("/dashboard"));
        assert!(routes.is_protected("/dashboard/x"));
    }
}
