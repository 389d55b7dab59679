//! Authentication routes for login, callback, and logout.
//!
//! The callback is where the session comes into being: after the code
//! exchange, the token and profile entries are written through the cookie
//! session store. Logout destroys the fixed session entries and sends the
//! browser to the provider's logout endpoint.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::sync::Arc;
use time::Duration;
use turnstile_identity::{AuthState, SessionStore};

use super::{AppState, session::CookieSessionStore};

/// Auth state cookie name (for CSRF protection during the OIDC flow).
const AUTH_STATE_COOKIE: &str = "auth_state";

/// Query parameters for the OIDC callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: String,
    state: String,
}

/// Initiates the login flow by redirecting to the identity provider.
pub async fn login(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    let (auth_url, auth_state) = state.oidc.authorization_url();

    // Stash the auth state in a secure cookie for validation on callback
    let auth_state_json = serde_json::to_string(&auth_state).expect("serialize auth state");

    let cookie = Cookie::build((AUTH_STATE_COOKIE, auth_state_json))
        .path("/")
        .http_only(true)
        .secure(state.gate.settings.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(Duration::minutes(10));

    (jar.add(cookie), Redirect::to(&auth_url))
}

/// Handles the provider callback: validates CSRF state, exchanges the code,
/// and writes the session entries.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AuthRouteError> {
    let auth_state_cookie = jar
        .get(AUTH_STATE_COOKIE)
        .ok_or(AuthRouteError::MissingAuthState)?;

    let auth_state: AuthState = serde_json::from_str(auth_state_cookie.value())
        .map_err(|_| AuthRouteError::InvalidAuthState)?;

    if query.state != auth_state.csrf_token {
        return Err(AuthRouteError::CsrfMismatch);
    }

    let tokens = state
        .oidc
        .exchange_code(&query.code, &auth_state)
        .await
        .map_err(|e| AuthRouteError::TokenExchange(e.to_string()))?;

    let mut session = CookieSessionStore::new(state.gate.settings.secure_cookies);
    state
        .oidc
        .establish_session(&mut session, tokens)
        .await
        .map_err(|e| AuthRouteError::TokenExchange(e.to_string()))?;

    let remove_auth_state = Cookie::build((AUTH_STATE_COOKIE, ""))
        .path("/")
        .max_age(Duration::ZERO);

    Ok((jar.add(remove_auth_state), session.into_jar(), Redirect::to("/")))
}

/// Logs out by destroying the session entries and redirecting to the
/// provider's logout endpoint.
pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
    let mut session =
        CookieSessionStore::from_headers(&headers, state.gate.settings.secure_cookies);
    session.destroy().await;

    let logout_url = state.oidc.logout_url();
    (session.into_jar(), Redirect::to(&logout_url))
}

/// Errors from the authentication routes.
#[derive(Debug)]
pub enum AuthRouteError {
    MissingAuthState,
    InvalidAuthState,
    CsrfMismatch,
    TokenExchange(String),
}

impl IntoResponse for AuthRouteError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingAuthState => (StatusCode::BAD_REQUEST, "Missing auth state"),
            Self::InvalidAuthState => (StatusCode::BAD_REQUEST, "Invalid auth state"),
            Self::CsrfMismatch => (StatusCode::BAD_REQUEST, "CSRF token mismatch"),
            Self::TokenExchange(msg) => {
                tracing::error!("Token exchange failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Authentication failed")
            }
        };

        (status, message).into_response()
    }
}
