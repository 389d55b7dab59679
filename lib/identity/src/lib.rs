//! Identity-provider handle and session storage contract for turnstile.
//!
//! This crate provides:
//! - The session storage contract (`SessionStore`, `SessionValue`) the
//!   provider persists its state through
//! - The identity-provider capability (`IdentityProvider`) consumed by the
//!   request gates
//! - A concrete OIDC-backed client (`OidcClient`) built once at process
//!   start via provider discovery
//! - Configuration (`IdentityConfig`) and error types
//!
//! The cookie *is* the session: entries are written during the login
//! callback, read on every gated request, and deleted on logout. There is
//! no server-side session store.
//!
//! # Example
//!
//! ```
//! use turnstile_identity::{SessionValue, SESSION_KEYS};
//!
//! // Strings are stored verbatim, structured values as JSON text.
//! let text = SessionValue::from("tok_abc123");
//! assert_eq!(text.into_storable(), "tok_abc123");
//!
//! let value = SessionValue::from(serde_json::json!({"id": "u1"}));
//! assert_eq!(value.into_storable(), r#"{"id":"u1"}"#);
//!
//! // Logout removes exactly these entries.
//! assert_eq!(SESSION_KEYS, ["id_token", "access_token", "user", "refresh_token"]);
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod provider;
pub mod session;
pub mod user;

// Re-export main types at crate root
pub use client::{AuthState, OidcClient, SessionTokens};
pub use config::IdentityConfig;
pub use error::{IdentityError, Result};
pub use provider::IdentityProvider;
pub use session::{MemorySessionStore, SESSION_KEYS, SessionStore, SessionValue};
pub use user::UserProfile;
