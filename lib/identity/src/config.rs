//! Identity provider configuration.
//!
//! Five settings are required to talk to the provider's authorization-code
//! flow: the authorization domain, client id, client secret, redirect URI,
//! and logout redirect URI. The remaining fields have defaults and can be
//! omitted when loading from environment variables.

use serde::{Deserialize, Serialize};

/// Configuration for the external identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// The provider's authorization domain (e.g., "https://auth.example.com").
    /// Used as the issuer URL for OIDC discovery.
    auth_domain: String,
    /// The OAuth2 client ID registered with the provider.
    client_id: String,
    /// The OAuth2 client secret.
    client_secret: String,
    /// The redirect URI for the OAuth2 callback.
    redirect_uri: String,
    /// Where the provider sends the browser after logout.
    logout_redirect_uri: String,
    /// OAuth2 scopes to request as a comma-separated string.
    /// Default: "openid,email,profile"
    #[serde(default = "default_scopes")]
    scopes: String,
    /// The access-token claim holding the permission sequence.
    /// Default: "permissions"
    #[serde(default = "default_permissions_claim")]
    permissions_claim: String,
}

fn default_scopes() -> String {
    "openid,email,profile".to_string()
}

fn default_permissions_claim() -> String {
    "permissions".to_string()
}

impl IdentityConfig {
    /// Creates a new configuration with defaults for optional fields.
    #[must_use]
    pub fn new(
        auth_domain: String,
        client_id: String,
        client_secret: String,
        redirect_uri: String,
        logout_redirect_uri: String,
    ) -> Self {
        Self {
            auth_domain,
            client_id,
            client_secret,
            redirect_uri,
            logout_redirect_uri,
            scopes: default_scopes(),
            permissions_claim: default_permissions_claim(),
        }
    }

    /// Returns the provider's authorization domain.
    #[must_use]
    pub fn auth_domain(&self) -> &str {
        &self.auth_domain
    }

    /// Returns the OAuth2 client ID.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the OAuth2 client secret.
    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Returns the OAuth2 redirect URI.
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Returns the post-logout redirect URI.
    #[must_use]
    pub fn logout_redirect_uri(&self) -> &str {
        &self.logout_redirect_uri
    }

    /// Returns the scopes to request, parsed from the comma-separated string.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scopes.split(',').map(str::trim).collect()
    }

    /// Returns the name of the access-token claim holding permissions.
    #[must_use]
    pub fn permissions_claim(&self) -> &str {
        &self.permissions_claim
    }

    /// Overrides the scopes to request.
    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes.join(",");
        self
    }

    /// Overrides the permissions claim name.
    #[must_use]
    pub fn with_permissions_claim(mut self, claim: String) -> Self {
        self.permissions_claim = claim;
        self
    }
}
