//! Gated API endpoints.

use axum::Json;
use serde_json::{Value, json};
use turnstile_identity::UserProfile;

use crate::auth::{RequireStaff, RequireUser};

/// Returns the authenticated user's profile.
pub async fn me(RequireUser(profile): RequireUser) -> Json<UserProfile> {
    Json(profile)
}

/// Staff-only overview endpoint.
pub async fn staff_overview(RequireStaff(profile): RequireStaff) -> Json<Value> {
    Json(json!({
        "viewer": profile.id,
        "area": "staff",
    }))
}
