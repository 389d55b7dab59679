//! User profile returned by the identity provider.

use serde::{Deserialize, Serialize};

/// Profile of the authenticated user, as written to the session during the
/// login callback.
///
/// The middleware treats this as an attribute bag: beyond the subject id,
/// every field is optional and provider-defined claims are preserved
/// untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// The subject claim (unique user identifier from the provider).
    pub id: String,
    /// Email address, if the provider supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Display name, from the `name` or `preferred_username` claim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Profile picture URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    /// Any additional provider-defined claims, kept as-is.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserProfile {
    /// Creates a profile with only the subject id set.
    #[must_use]
    pub fn new(id: String) -> Self {
        Self {
            id,
            email: None,
            name: None,
            picture: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Sets the email claim.
    #[must_use]
    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    /// Sets the picture URL.
    #[must_use]
    pub fn with_picture(mut self, picture: Option<String>) -> Self {
        self.picture = picture;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_builder() {
        let profile = UserProfile::new("auth0|123".to_string())
            .with_email(Some("alice@example.com".to_string()))
            .with_name(Some("Alice".to_string()));

        assert_eq!(profile.id, "auth0|123");
        assert_eq!(profile.email.as_deref(), Some("alice@example.com"));
        assert_eq!(profile.name.as_deref(), Some("Alice"));
        assert!(profile.picture.is_none());
    }

    #[test]
    fn unknown_claims_survive_roundtrip() {
        let json = r#"{"id": "u1", "email": "a@example.com", "org_code": "acme"}"#;
        let profile: UserProfile = serde_json::from_str(json).expect("deserialize");

        assert_eq!(profile.extra["org_code"], "acme");

        let out = serde_json::to_value(&profile).expect("serialize");
        assert_eq!(out["org_code"], "acme");
    }

    #[test]
    fn optional_fields_are_omitted_when_absent() {
        let profile = UserProfile::new("u1".to_string());
        let out = serde_json::to_value(&profile).expect("serialize");

        assert!(out.get("email").is_none());
        assert!(out.get("name").is_none());
    }
}
