//! Cookie-backed session storage.
//!
//! Adapts the identity crate's [`SessionStore`] contract to the cookies of
//! a single request/response pair. Reads come from the request's `Cookie`
//! header; writes and removals accumulate in a jar that is applied to the
//! response's `Set-Cookie` headers when the handler finishes.

use async_trait::async_trait;
use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;
use turnstile_identity::{SessionStore, SessionValue};

/// [`SessionStore`] implementation over HTTP cookies.
///
/// All cookies are written HTTP-only with `SameSite=Lax`; the Secure flag
/// follows configuration. No explicit expiry is set, so cookie lifetime
/// defaults to the browser session unless the provider sets one.
pub struct CookieSessionStore {
    jar: CookieJar,
    secure: bool,
}

impl CookieSessionStore {
    /// Creates a store with no pending cookies, for write-only use.
    #[must_use]
    pub fn new(secure: bool) -> Self {
        Self {
            jar: CookieJar::new(),
            secure,
        }
    }

    /// Creates a store bound to the cookies of the given request headers.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap, secure: bool) -> Self {
        Self {
            jar: CookieJar::from_headers(headers),
            secure,
        }
    }

    /// Consumes the store, returning the jar to apply to the response.
    #[must_use]
    pub fn into_jar(self) -> CookieJar {
        self.jar
    }
}

#[async_trait]
impl SessionStore for CookieSessionStore {
    async fn get_item(&self, key: &str) -> Option<String> {
        self.jar.get(key).map(|cookie| cookie.value().to_string())
    }

    async fn set_item(&mut self, key: &str, value: SessionValue) {
        let cookie = Cookie::build((key.to_string(), value.into_storable()))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax);

        self.jar = self.jar.clone().add(cookie);
    }

    async fn remove_item(&mut self, key: &str) {
        let removal = Cookie::build((key.to_string(), ""))
            .path("/")
            .max_age(Duration::ZERO);

        self.jar = self.jar.clone().add(removal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::{COOKIE, SET_COOKIE};
    use axum::response::IntoResponse;
    use serde_json::json;
    use turnstile_identity::SESSION_KEYS;

    fn request_headers(cookie_header: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, cookie_header.parse().expect("valid header"));
        headers
    }

    fn set_cookie_headers(store: CookieSessionStore) -> Vec<String> {
        let response = (store.into_jar(), ()).into_response();
        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().expect("utf8").to_string())
            .collect()
    }

    #[tokio::test]
    async fn reads_raw_cookie_values() {
        let headers = request_headers("access_token=tok_abc; theme=dark");
        let store = CookieSessionStore::from_headers(&headers, true);

        assert_eq!(
            store.get_item("access_token").await,
            Some("tok_abc".to_string())
        );
        assert_eq!(store.get_item("id_token").await, None);
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let mut store = CookieSessionStore::new(true);
        store.set_item("id_token", "jwt-value".into()).await;
        store
            .set_item("user", json!({"id": "u1"}).into())
            .await;

        assert_eq!(store.get_item("id_token").await, Some("jwt-value".to_string()));
        assert_eq!(
            store.get_item("user").await,
            Some(r#"{"id":"u1"}"#.to_string())
        );
    }

    #[tokio::test]
    async fn written_cookies_carry_the_required_attributes() {
        let mut store = CookieSessionStore::new(true);
        store.set_item("access_token", "tok".into()).await;

        let headers = set_cookie_headers(store);
        assert_eq!(headers.len(), 1);
        let cookie = &headers[0];
        assert!(cookie.contains("HttpOnly"), "{cookie}");
        assert!(cookie.contains("Secure"), "{cookie}");
        assert!(cookie.contains("SameSite=Lax"), "{cookie}");
        assert!(cookie.contains("Path=/"), "{cookie}");
        assert!(!cookie.contains("Max-Age"), "{cookie}");
    }

    #[tokio::test]
    async fn secure_flag_follows_configuration() {
        let mut store = CookieSessionStore::new(false);
        store.set_item("access_token", "tok".into()).await;

        let headers = set_cookie_headers(store);
        assert!(!headers[0].contains("Secure"), "{}", headers[0]);
    }

    #[tokio::test]
    async fn remove_writes_an_expired_cookie() {
        let headers = request_headers("id_token=jwt");
        let mut store = CookieSessionStore::from_headers(&headers, true);
        store.remove_item("id_token").await;

        let headers = set_cookie_headers(store);
        let removal = headers
            .iter()
            .find(|h| h.starts_with("id_token="))
            .expect("removal cookie");
        assert!(removal.contains("Max-Age=0"), "{removal}");
    }

    #[tokio::test]
    async fn destroy_expires_exactly_the_session_keys() {
        let headers =
            request_headers("id_token=a; access_token=b; user=c; refresh_token=d; theme=dark");
        let mut store = CookieSessionStore::from_headers(&headers, true);
        store.destroy().await;

        let headers = set_cookie_headers(store);
        for key in SESSION_KEYS {
            let removal = headers
                .iter()
                .find(|h| h.starts_with(&format!("{key}=")))
                .unwrap_or_else(|| panic!("no removal for {key}"));
            assert!(removal.contains("Max-Age=0"), "{removal}");
        }
        // Cookies outside the fixed set are untouched.
        assert!(!headers.iter().any(|h| h.starts_with("theme=")));
    }
}
