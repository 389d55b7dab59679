//! The identity-provider capability consumed by the request gates.
//!
//! The gates only ever ask three questions of the provider, all answered
//! from the current request's session. Keeping this behind a trait lets
//! the web layer be exercised against a mock provider.

use crate::error::{IdentityError, Result};
use crate::session::SessionStore;
use crate::user::UserProfile;
use async_trait::async_trait;
use rootcause::Report;

/// External identity-provider operations, evaluated against the session
/// bound to the current request.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Returns true if the session holds valid, unexpired tokens.
    async fn is_authenticated(&self, session: &dyn SessionStore) -> Result<bool>;

    /// Returns the user profile for the current session.
    async fn user_profile(&self, session: &dyn SessionStore) -> Result<UserProfile>;

    /// Returns the ordered permission strings for the current session.
    async fn permissions(&self, session: &dyn SessionStore) -> Result<Vec<String>>;
}

/// Convenience constructor for a missing-session-item report.
pub(crate) fn missing_item(key: &str) -> Report<IdentityError> {
    IdentityError::MissingSessionItem {
        key: key.to_string(),
    }
    .into()
}
