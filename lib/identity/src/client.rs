//! OIDC client implementation using the openidconnect crate.
//!
//! The client is constructed once at process start via provider discovery
//! and is immutable afterwards. Session inspection (authentication checks,
//! profile and permission lookups) reads only the session entries written
//! during the login callback; token exchange and signature verification are
//! delegated to the openidconnect crate.

use crate::config::IdentityConfig;
use crate::error::{IdentityError, Result};
use crate::provider::{IdentityProvider, missing_item};
use crate::session::{SessionStore, SessionValue};
use crate::user::UserProfile;
use async_trait::async_trait;
use chrono::Utc;
use openidconnect::core::{CoreAuthenticationFlow, CoreClient, CoreProviderMetadata};
use openidconnect::{
    AuthorizationCode, ClientId, ClientSecret, CsrfToken, IssuerUrl, Nonce, OAuth2TokenResponse,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope, TokenResponse,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configured handle to the external identity provider.
pub struct OidcClient {
    provider_metadata: CoreProviderMetadata,
    client_id: ClientId,
    client_secret: ClientSecret,
    redirect_url: RedirectUrl,
    config: IdentityConfig,
}

/// State carried across the login redirect, for CSRF and nonce validation
/// on the callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthState {
    pub csrf_token: String,
    pub pkce_verifier: String,
    pub nonce: String,
}

/// Tokens and profile produced by a successful code exchange.
pub struct SessionTokens {
    pub id_token: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub profile: UserProfile,
}

impl OidcClient {
    /// Creates a new client by discovering the provider metadata.
    pub async fn discover(config: IdentityConfig) -> Result<Self> {
        let issuer_url = IssuerUrl::new(config.auth_domain().to_string()).map_err(|e| {
            IdentityError::Configuration {
                reason: format!("invalid auth domain: {e}"),
            }
        })?;

        let http_client = build_http_client()?;

        let provider_metadata = CoreProviderMetadata::discover_async(issuer_url, &http_client)
            .await
            .map_err(|e| IdentityError::Discovery {
                reason: e.to_string(),
            })?;

        let redirect_url = RedirectUrl::new(config.redirect_uri().to_string()).map_err(|e| {
            IdentityError::Configuration {
                reason: format!("invalid redirect URI: {e}"),
            }
        })?;

        let client_id = ClientId::new(config.client_id().to_string());
        let client_secret = ClientSecret::new(config.client_secret().to_string());

        Ok(Self {
            provider_metadata,
            client_id,
            client_secret,
            redirect_url,
            config,
        })
    }

    /// Generates the authorization URL for redirecting the user.
    pub fn authorization_url(&self) -> (String, AuthState) {
        let client = CoreClient::from_provider_metadata(
            self.provider_metadata.clone(),
            self.client_id.clone(),
            Some(self.client_secret.clone()),
        )
        .set_redirect_uri(self.redirect_url.clone());

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut auth_request = client
            .authorize_url(
                CoreAuthenticationFlow::AuthorizationCode,
                CsrfToken::new_random,
                Nonce::new_random,
            )
            .set_pkce_challenge(pkce_challenge);

        for scope in self.config.scopes() {
            auth_request = auth_request.add_scope(Scope::new(scope.to_string()));
        }

        let (auth_url, csrf_token, nonce) = auth_request.url();

        let state = AuthState {
            csrf_token: csrf_token.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
            nonce: nonce.secret().clone(),
        };

        (auth_url.to_string(), state)
    }

    /// Exchanges the authorization code for tokens and extracts the profile.
    pub async fn exchange_code(&self, code: &str, state: &AuthState) -> Result<SessionTokens> {
        let client = CoreClient::from_provider_metadata(
            self.provider_metadata.clone(),
            self.client_id.clone(),
            Some(self.client_secret.clone()),
        )
        .set_redirect_uri(self.redirect_url.clone());

        let pkce_verifier = PkceCodeVerifier::new(state.pkce_verifier.clone());
        let http_client = build_http_client()?;

        let token_request = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .map_err(|e| IdentityError::TokenExchange {
                reason: format!("token endpoint error: {e}"),
            })?;

        let token_response = token_request
            .set_pkce_verifier(pkce_verifier)
            .request_async(&http_client)
            .await
            .map_err(|e| IdentityError::TokenExchange {
                reason: e.to_string(),
            })?;

        let id_token = token_response
            .id_token()
            .ok_or_else(|| IdentityError::TokenExchange {
                reason: "no ID token in response".to_string(),
            })?;

        // Verify the ID token signature and nonce before trusting any claim.
        let nonce = Nonce::new(state.nonce.clone());
        let claims = id_token
            .claims(&client.id_token_verifier(), &nonce)
            .map_err(|e| IdentityError::InvalidToken {
                reason: format!("ID token validation failed: {e}"),
            })?;

        let profile = UserProfile::new(claims.subject().to_string())
            .with_email(claims.email().map(|e| e.as_str().to_string()))
            .with_name(
                claims
                    .name()
                    .and_then(|n| n.get(None))
                    .map(|n| n.as_str().to_string())
                    .or_else(|| claims.preferred_username().map(|u| u.as_str().to_string())),
            )
            .with_picture(
                claims
                    .picture()
                    .and_then(|p| p.get(None))
                    .map(|p| p.as_str().to_string()),
            );

        // The raw JWT string is what gets stored in the session; the typed
        // response only exposes it through serialization.
        let raw_id_token = raw_id_token(&token_response)?;

        debug!(subject = %profile.id, "token exchange completed");

        Ok(SessionTokens {
            id_token: raw_id_token,
            access_token: token_response.access_token().secret().clone(),
            refresh_token: token_response.refresh_token().map(|t| t.secret().clone()),
            profile,
        })
    }

    /// Writes the session entries for a completed login.
    pub async fn establish_session(
        &self,
        session: &mut dyn SessionStore,
        tokens: SessionTokens,
    ) -> Result<()> {
        let profile_json =
            serde_json::to_value(&tokens.profile).map_err(|e| IdentityError::ProfileDecode {
                reason: e.to_string(),
            })?;

        session
            .set_item("id_token", SessionValue::Text(tokens.id_token))
            .await;
        session
            .set_item("access_token", SessionValue::Text(tokens.access_token))
            .await;
        session
            .set_item("user", SessionValue::Json(profile_json))
            .await;
        if let Some(refresh_token) = tokens.refresh_token {
            session
                .set_item("refresh_token", SessionValue::Text(refresh_token))
                .await;
        }

        Ok(())
    }

    /// Returns the provider logout URL with the post-logout redirect.
    #[must_use]
    pub fn logout_url(&self) -> String {
        build_logout_url(
            self.config.auth_domain(),
            self.config.logout_redirect_uri(),
        )
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &IdentityConfig {
        &self.config
    }
}

#[async_trait]
impl IdentityProvider for OidcClient {
    async fn is_authenticated(&self, session: &dyn SessionStore) -> Result<bool> {
        session_is_authenticated(session).await
    }

    async fn user_profile(&self, session: &dyn SessionStore) -> Result<UserProfile> {
        session_user_profile(session).await
    }

    async fn permissions(&self, session: &dyn SessionStore) -> Result<Vec<String>> {
        session_permissions(session, self.config.permissions_claim()).await
    }
}

/// Builds the provider logout URL, percent-encoding the redirect so a
/// redirect URI carrying its own query string survives intact.
fn build_logout_url(auth_domain: &str, logout_redirect_uri: &str) -> String {
    let redirect: String =
        openidconnect::url::form_urlencoded::byte_serialize(logout_redirect_uri.as_bytes())
            .collect();

    format!(
        "{}/logout?redirect={}",
        auth_domain.trim_end_matches('/'),
        redirect
    )
}

fn build_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| {
            IdentityError::Configuration {
                reason: format!("failed to create HTTP client: {e}"),
            }
            .into()
        })
}

/// Extracts the raw ID token JWT from a token response.
///
/// The typed response wraps the token; serializing to JSON exposes the
/// original string.
fn raw_id_token<TR>(token_response: &TR) -> Result<String>
where
    TR: serde::Serialize,
{
    let response_json =
        serde_json::to_value(token_response).map_err(|e| IdentityError::InvalidToken {
            reason: format!("failed to serialize token response: {e}"),
        })?;

    response_json
        .get("id_token")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            IdentityError::InvalidToken {
                reason: "no id_token in response".to_string(),
            }
            .into()
        })
}

/// Decodes a JWT's payload without verifying the signature.
///
/// Signature verification happened when the token entered the session; this
/// only peeks at claims of tokens the provider already issued.
fn decode_jwt_claims(token: &str) -> Result<serde_json::Value> {
    use base64::Engine;

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(IdentityError::InvalidToken {
            reason: "not a JWT".to_string(),
        }
        .into());
    }

    let payload_bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|e| IdentityError::InvalidToken {
            reason: format!("failed to decode payload: {e}"),
        })?;

    serde_json::from_slice(&payload_bytes).map_err(|e| {
        IdentityError::InvalidToken {
            reason: format!("failed to parse payload: {e}"),
        }
        .into()
    })
}

/// Returns true if the claims' `exp` lies in the future.
///
/// A token with no `exp` claim is treated as expired.
fn token_is_live(claims: &serde_json::Value) -> bool {
    claims
        .get("exp")
        .and_then(serde_json::Value::as_i64)
        .map(|exp| exp > Utc::now().timestamp())
        .unwrap_or(false)
}

/// Authentication check against the session's stored tokens.
///
/// Absent tokens mean "not authenticated"; a present but undecodable token
/// is an error.
async fn session_is_authenticated(session: &dyn SessionStore) -> Result<bool> {
    if session.get_item("id_token").await.is_none() {
        return Ok(false);
    }

    let Some(access_token) = session.get_item("access_token").await else {
        return Ok(false);
    };

    let claims = decode_jwt_claims(&access_token)?;
    Ok(token_is_live(&claims))
}

async fn session_user_profile(session: &dyn SessionStore) -> Result<UserProfile> {
    let raw = session
        .get_item("user")
        .await
        .ok_or_else(|| missing_item("user"))?;

    serde_json::from_str(&raw).map_err(|e| {
        IdentityError::ProfileDecode {
            reason: e.to_string(),
        }
        .into()
    })
}

async fn session_permissions(session: &dyn SessionStore, claim: &str) -> Result<Vec<String>> {
    // An anonymous session holds no permissions; only a present but
    // undecodable token is an error.
    let Some(access_token) = session.get_item("access_token").await else {
        return Ok(Vec::new());
    };

    let claims = decode_jwt_claims(&access_token)?;

    // An absent claim is an empty permission set, not an error.
    let permissions = claims
        .get(claim)
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default();

    Ok(permissions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySessionStore;
    use base64::Engine;
    use serde_json::json;

    /// Builds an unsigned JWT with the given payload, enough for claim
    /// inspection.
    fn fake_jwt(payload: serde_json::Value) -> String {
        let engine = &base64::engine::general_purpose::URL_SAFE_NO_PAD;
        let header = engine.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
        let body = engine.encode(payload.to_string());
        format!("{header}.{body}.sig")
    }

    fn live_token(extra: serde_json::Value) -> String {
        let mut payload = json!({"exp": Utc::now().timestamp() + 3600});
        payload
            .as_object_mut()
            .unwrap()
            .extend(extra.as_object().cloned().unwrap_or_default());
        fake_jwt(payload)
    }

    async fn session_with_tokens(access_token: &str) -> MemorySessionStore {
        let mut store = MemorySessionStore::new();
        store.set_item("id_token", fake_jwt(json!({})).into()).await;
        store.set_item("access_token", access_token.into()).await;
        store
    }

    #[test]
    fn decode_jwt_claims_reads_payload() {
        let token = fake_jwt(json!({"sub": "u1", "exp": 123}));
        let claims = decode_jwt_claims(&token).expect("decode");
        assert_eq!(claims["sub"], "u1");
        assert_eq!(claims["exp"], 123);
    }

    #[test]
    fn decode_jwt_claims_rejects_non_jwt() {
        assert!(decode_jwt_claims("not-a-jwt").is_err());
        assert!(decode_jwt_claims("a.b").is_err());
    }

    #[test]
    fn token_liveness() {
        let future = json!({"exp": Utc::now().timestamp() + 60});
        let past = json!({"exp": Utc::now().timestamp() - 60});
        let missing = json!({"sub": "u1"});

        assert!(token_is_live(&future));
        assert!(!token_is_live(&past));
        assert!(!token_is_live(&missing));
    }

    #[tokio::test]
    async fn empty_session_is_not_authenticated() {
        let store = MemorySessionStore::new();
        let authed = session_is_authenticated(&store).await.expect("check");
        assert!(!authed);
    }

    #[tokio::test]
    async fn live_tokens_are_authenticated() {
        let store = session_with_tokens(&live_token(json!({}))).await;
        assert!(session_is_authenticated(&store).await.expect("check"));
    }

    #[tokio::test]
    async fn expired_access_token_is_not_authenticated() {
        let expired = fake_jwt(json!({"exp": Utc::now().timestamp() - 3600}));
        let store = session_with_tokens(&expired).await;
        assert!(!session_is_authenticated(&store).await.expect("check"));
    }

    #[tokio::test]
    async fn malformed_access_token_is_an_error() {
        let store = session_with_tokens("garbage").await;
        assert!(session_is_authenticated(&store).await.is_err());
    }

    #[tokio::test]
    async fn profile_reads_user_entry() {
        let mut store = MemorySessionStore::new();
        store
            .set_item("user", json!({"id": "u1", "email": "a@example.com"}).into())
            .await;

        let profile = session_user_profile(&store).await.expect("profile");
        assert_eq!(profile.id, "u1");
        assert_eq!(profile.email.as_deref(), Some("a@example.com"));
    }

    #[tokio::test]
    async fn profile_missing_is_an_error() {
        let store = MemorySessionStore::new();
        assert!(session_user_profile(&store).await.is_err());
    }

    #[tokio::test]
    async fn permissions_come_from_access_token_claim() {
        let token = live_token(json!({"permissions": ["staff-perm", "viewer"]}));
        let store = session_with_tokens(&token).await;

        let perms = session_permissions(&store, "permissions")
            .await
            .expect("permissions");
        assert_eq!(perms, vec!["staff-perm", "viewer"]);
    }

    #[tokio::test]
    async fn absent_permissions_claim_is_empty() {
        let store = session_with_tokens(&live_token(json!({}))).await;
        let perms = session_permissions(&store, "permissions")
            .await
            .expect("permissions");
        assert!(perms.is_empty());
    }

    #[tokio::test]
    async fn empty_session_has_no_permissions() {
        let store = MemorySessionStore::new();
        let perms = session_permissions(&store, "permissions")
            .await
            .expect("permissions");
        assert!(perms.is_empty());
    }

    #[tokio::test]
    async fn malformed_access_token_fails_permission_lookup() {
        let store = session_with_tokens("garbage").await;
        assert!(session_permissions(&store, "permissions").await.is_err());
    }

    #[test]
    fn logout_url_joins_domain_and_redirect() {
        let url = build_logout_url("https://auth.example.com/", "https://app.example.com/");
        assert_eq!(
            url,
            "https://auth.example.com/logout?redirect=https%3A%2F%2Fapp.example.com%2F"
        );
    }

    #[test]
    fn logout_url_encodes_redirects_with_query_strings() {
        let url = build_logout_url(
            "https://auth.example.com",
            "https://app.example.com/bye?from=logout&lang=en",
        );

        // The redirect's own query must not leak into the provider URL.
        assert_eq!(url.matches('?').count(), 1);
        assert!(!url.contains('&'), "{url}");
        assert!(url.contains("%3Ffrom%3Dlogout%26lang%3Den"), "{url}");
    }
}
