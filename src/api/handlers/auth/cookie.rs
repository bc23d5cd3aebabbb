//! Refresh cookie handling: build, clear, and extract.
//!
//! The opaque refresh token travels exclusively in an `HttpOnly` cookie; it
//! never appears in a response body.

use axum::http::{HeaderMap, HeaderValue, header::InvalidHeaderValue};

use super::state::AuthConfig;

pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// Build the `Set-Cookie` value carrying a fresh refresh token.
///
/// # Errors
/// Returns an error if the token contains bytes invalid in a header value.
pub fn refresh_cookie(
    config: &AuthConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let max_age = config.refresh_ttl_seconds();
    let same_site = config.cookie_same_site().as_str();
    let mut cookie = format!(
        "{REFRESH_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite={same_site}; Max-Age={max_age}"
    );
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Build the `Set-Cookie` value that clears the refresh cookie.
///
/// # Errors
/// Returns an error if the assembled value is not a valid header value.
pub fn clear_refresh_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let same_site = config.cookie_same_site().as_str();
    let mut cookie =
        format!("{REFRESH_COOKIE_NAME}=; Path=/; HttpOnly; SameSite={same_site}; Max-Age=0");
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Pull the refresh token out of the request's `Cookie` header, if present.
#[must_use]
pub fn extract_refresh_token(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(axum::http::header::COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == REFRESH_COOKIE_NAME && !val.is_empty() {
            return Some(val.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::CookieSameSite;
    use axum::http::header::COOKIE;

    fn config() -> AuthConfig {
        AuthConfig::new("http://localhost:5173".to_string())
    }

    #[test]
    fn refresh_cookie_carries_token_and_attributes() {
        let cookie = refresh_cookie(&config(), "tok-123").expect("cookie");
        let value = cookie.to_str().expect("ascii");
        assert!(value.starts_with("refresh_token=tok-123; "));
        assert!(value.contains("Path=/"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("SameSite=Lax"));
        assert!(value.contains("Max-Age=604800"));
        assert!(!value.contains("Secure"));
    }

    #[test]
    fn secure_and_same_site_are_configurable() {
        let config = config()
            .with_cookie_secure(true)
            .with_cookie_same_site(CookieSameSite::None)
            .with_refresh_ttl_seconds(120);
        let cookie = refresh_cookie(&config, "tok").expect("cookie");
        let value = cookie.to_str().expect("ascii");
        assert!(value.contains("SameSite=None"));
        assert!(value.contains("Max-Age=120"));
        assert!(value.ends_with("; Secure"));
    }

    #[test]
    fn clear_cookie_zeroes_max_age() {
        let cookie = clear_refresh_cookie(&config()).expect("cookie");
        let value = cookie.to_str().expect("ascii");
        assert!(value.starts_with("refresh_token=;"));
        assert!(value.contains("Max-Age=0"));
    }

    #[test]
    fn extracts_token_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; refresh_token=tok-123; lang=en"),
        );
        assert_eq!(
            extract_refresh_token(&headers),
            Some("tok-123".to_string())
        );
    }

    #[test]
    fn missing_or_empty_cookie_is_none() {
        let headers = HeaderMap::new();
        assert_eq!(extract_refresh_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("refresh_token="));
        assert_eq!(extract_refresh_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("session=abc"));
        assert_eq!(extract_refresh_token(&headers), None);
    }
}
