//! Authentication core: sessions, credential resolution, route gating and
//! the account flows (signup, confirmation, password reset).
//!
//! Everything that can fail for a caller maps onto the closed error taxonomy
//! in [`error`]; the raw provider detail stays in the logs.

pub mod confirm;
pub mod error;
pub mod password;
pub mod provider;
pub mod redirect;
pub mod resolver;
pub mod routes;
pub mod session;
pub mod signup;
pub mod state;
pub mod types;

pub use provider::{HttpIdentityProvider, IdentityProvider};
pub use routes::{RouteClassifier, route_gate};
pub use state::{AuthConfig, AuthState};
