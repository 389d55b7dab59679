//! Authentication and staff gates, as Axum extractors.
//!
//! Each gate binds a cookie session store to the incoming request, asks
//! the identity provider about it, and either hands the resolved profile
//! to the handler or rejects the request. Provider failures map to a 502
//! response rather than being swallowed; downstream handlers can assume a
//! validated session and a populated profile.

use axum::{
    Json,
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::sync::Arc;
use turnstile_identity::{IdentityProvider, UserProfile};

use super::session::CookieSessionStore;
use crate::config::GateConfig;

/// State required by the gates, extractable from any router state via
/// [`FromRef`].
#[derive(Clone)]
pub struct GateState {
    /// The identity provider, behind a trait object so tests can supply a
    /// mock.
    pub provider: Arc<dyn IdentityProvider>,
    /// Gate behavior settings.
    pub settings: Arc<GateConfig>,
}

/// Extractor requiring an authenticated session.
///
/// On success the user profile is attached to the request extensions and
/// handed to the handler. Authentication is re-checked on every request;
/// nothing is cached across requests.
pub struct RequireUser(pub UserProfile);

impl<S> FromRequestParts<S> for RequireUser
where
    GateState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = GateRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let gate = GateState::from_ref(state);
        let session = CookieSessionStore::from_headers(&parts.headers, gate.settings.secure_cookies);

        let authenticated = gate
            .provider
            .is_authenticated(&session)
            .await
            .map_err(provider_failure)?;

        if !authenticated {
            return Err(GateRejection::Unauthorized);
        }

        let profile = gate
            .provider
            .user_profile(&session)
            .await
            .map_err(provider_failure)?;

        parts.extensions.insert(profile.clone());

        Ok(RequireUser(profile))
    }
}

/// Extractor additionally requiring the staff permission.
///
/// Only the first entry of the session's permission list is inspected,
/// compared for exact equality against the configured staff permission.
/// The default policy denies when the session is unauthenticated or the
/// permission differs; `legacy_staff_rule` switches to the historical
/// rule, which denies only when both checks fail at once.
pub struct RequireStaff(pub UserProfile);

impl<S> FromRequestParts<S> for RequireStaff
where
    GateState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = GateRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let gate = GateState::from_ref(state);
        let session = CookieSessionStore::from_headers(&parts.headers, gate.settings.secure_cookies);

        let authenticated = gate
            .provider
            .is_authenticated(&session)
            .await
            .map_err(provider_failure)?;

        // Under the default policy an unauthenticated session is already
        // denied; only the legacy rule needs the permission list to decide.
        if !gate.settings.legacy_staff_rule && !authenticated {
            return Err(GateRejection::Unauthorized);
        }

        let permissions = gate
            .provider
            .permissions(&session)
            .await
            .map_err(provider_failure)?;

        let has_permission =
            permissions.first().map(String::as_str) == Some(gate.settings.staff_permission.as_str());

        let denied = if gate.settings.legacy_staff_rule {
            !authenticated && !has_permission
        } else {
            !authenticated || !has_permission
        };

        if denied {
            return Err(GateRejection::Unauthorized);
        }

        let profile = gate
            .provider
            .user_profile(&session)
            .await
            .map_err(provider_failure)?;

        parts.extensions.insert(profile.clone());

        Ok(RequireStaff(profile))
    }
}

/// Rejection type for the gates.
#[derive(Debug)]
pub enum GateRejection {
    /// Session failed the gate's checks.
    Unauthorized,
    /// The identity provider could not be consulted.
    ProviderFailure,
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "Unauthorized"})),
            )
                .into_response(),
            Self::ProviderFailure => (
                StatusCode::BAD_GATEWAY,
                Json(json!({"error": "Identity provider unavailable"})),
            )
                .into_response(),
        }
    }
}

fn provider_failure(err: rootcause::Report<turnstile_identity::IdentityError>) -> GateRejection {
    tracing::error!(error = %err, "identity provider request failed");
    GateRejection::ProviderFailure
}
