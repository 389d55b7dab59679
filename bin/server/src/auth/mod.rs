//! Authentication module for the turnstile server.
//!
//! This module provides:
//! - Cookie-backed session storage (`CookieSessionStore`)
//! - Request gates for authenticated users and staff (`RequireUser`,
//!   `RequireStaff`)
//! - Login, callback, and logout routes
//!
//! # Session Model
//!
//! There is no server-side session store: the cookies *are* the session.
//! The login callback writes the token and profile entries, every gated
//! request re-validates them through the identity provider handle, and
//! logout deletes the fixed entry names. Nothing about a request's
//! authentication outlives that request.

pub mod middleware;
pub mod routes;
pub mod session;

use axum::extract::FromRef;
use std::sync::Arc;
use turnstile_identity::{IdentityProvider, OidcClient};

use crate::config::GateConfig;

pub use middleware::{GateRejection, GateState, RequireStaff, RequireUser};
pub use routes::{callback, login, logout};
pub use session::CookieSessionStore;

/// Shared application state.
pub struct AppState {
    /// Identity provider client, for the login/callback/logout flow.
    pub oidc: Arc<OidcClient>,
    /// State consumed by the request gates.
    pub gate: GateState,
}

impl AppState {
    /// Creates the application state from a discovered client.
    pub fn new(oidc: OidcClient, gate_config: GateConfig) -> Self {
        let oidc = Arc::new(oidc);
        let provider: Arc<dyn IdentityProvider> = oidc.clone();
        Self {
            oidc,
            gate: GateState {
                provider,
                settings: Arc::new(gate_config),
            },
        }
    }
}

impl FromRef<Arc<AppState>> for GateState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.gate.clone()
    }
}
