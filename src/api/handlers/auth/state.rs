//! Auth configuration: refresh TTL and cookie attributes.

const DEFAULT_REFRESH_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

/// `SameSite` attribute for the refresh cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieSameSite {
    Lax,
    Strict,
    None,
}

impl CookieSameSite {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lax => "Lax",
            Self::Strict => "Strict",
            Self::None => "None",
        }
    }

    /// Parse a CLI/env value.
    ///
    /// # Errors
    /// Returns a message suitable for clap when the value is not one of
    /// `lax`, `strict`, `none`.
    pub fn parse(value: &str) -> Result<Self, String> {
        match value.to_lowercase().as_str() {
            "lax" => Ok(Self::Lax),
            "strict" => Ok(Self::Strict),
            "none" => Ok(Self::None),
            _ => Err("invalid SameSite value (expected lax, strict or none)".to_string()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    refresh_ttl_seconds: i64,
    cookie_secure: bool,
    cookie_same_site: CookieSameSite,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String) -> Self {
        Self {
            frontend_base_url,
            refresh_ttl_seconds: DEFAULT_REFRESH_TTL_SECONDS,
            cookie_secure: false,
            cookie_same_site: CookieSameSite::Lax,
        }
    }

    #[must_use]
    pub fn with_refresh_ttl_seconds(mut self, seconds: i64) -> Self {
        self.refresh_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    #[must_use]
    pub fn with_cookie_same_site(mut self, same_site: CookieSameSite) -> Self {
        self.cookie_same_site = same_site;
        self
    }

    #[must_use]
    pub fn refresh_ttl_seconds(&self) -> i64 {
        self.refresh_ttl_seconds
    }

    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure
    }

    #[must_use]
    pub fn cookie_same_site(&self) -> CookieSameSite {
        self.cookie_same_site
    }

    pub(crate) fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_overrides() {
        let config = AuthConfig::new("http://localhost:5173".to_string());
        assert_eq!(config.refresh_ttl_seconds(), DEFAULT_REFRESH_TTL_SECONDS);
        assert!(!config.cookie_secure());
        assert_eq!(config.cookie_same_site(), CookieSameSite::Lax);
        assert_eq!(config.frontend_base_url(), "http://localhost:5173");

        let config = config
            .with_refresh_ttl_seconds(3600)
            .with_cookie_secure(true)
            .with_cookie_same_site(CookieSameSite::Strict);
        assert_eq!(config.refresh_ttl_seconds(), 3600);
        assert!(config.cookie_secure());
        assert_eq!(config.cookie_same_site(), CookieSameSite::Strict);
    }

    #[test]
    fn same_site_parsing() {
        assert_eq!(CookieSameSite::parse("lax"), Ok(CookieSameSite::Lax));
        assert_eq!(CookieSameSite::parse("Strict"), Ok(CookieSameSite::Strict));
        assert_eq!(CookieSameSite::parse("NONE"), Ok(CookieSameSite::None));
        assert!(CookieSameSite::parse("both").is_err());
    }

    #[test]
    fn same_site_attribute_values() {
        assert_eq!(CookieSameSite::Lax.as_str(), "Lax");
        assert_eq!(CookieSameSite::Strict.as_str(), "Strict");
        assert_eq!(CookieSameSite::None.as_str(), "None");
    }
}
