use crate::{
    api,
    api::handlers::auth::{AuthConfig, CookieSameSite},
    session::SessionCache,
    token::AccessTokenIssuer,
};
use anyhow::{Context, Result};
use deadpool_redis::{Config as RedisConfig, Runtime};
use secrecy::SecretString;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub cache_url: Option<String>,
    pub jwt_secret: SecretString,
    pub access_token_ttl_seconds: i64,
    pub refresh_ttl_seconds: i64,
    pub cookie_secure: bool,
    pub cookie_same_site: CookieSameSite,
    pub frontend_base_url: String,
}

/// Execute the server action.
///
/// # Errors
/// Returns an error if the cache pool cannot be built or the server fails to
/// start.
pub async fn execute(args: Args) -> Result<()> {
    let cache = build_cache(args.cache_url.as_deref())?;

    let auth_config = AuthConfig::new(args.frontend_base_url)
        .with_refresh_ttl_seconds(args.refresh_ttl_seconds)
        .with_cookie_secure(args.cookie_secure)
        .with_cookie_same_site(args.cookie_same_site);

    let issuer = AccessTokenIssuer::new(&args.jwt_secret, args.access_token_ttl_seconds);

    api::new(args.port, args.dsn, cache, auth_config, issuer).await
}

/// Select the cache backend from the CLI value. Pool construction is lazy:
/// an unreachable Redis shows up as cache misses, never as a startup failure.
fn build_cache(cache_url: Option<&str>) -> Result<SessionCache> {
    match cache_url {
        None => {
            info!("Session cache disabled");
            Ok(SessionCache::disabled())
        }
        Some(url) if url.starts_with("memory") => Ok(SessionCache::memory()),
        Some(url) => {
            let pool = RedisConfig::from_url(url)
                .create_pool(Some(Runtime::Tokio1))
                .context("Failed to create cache pool")?;
            Ok(SessionCache::redis(pool))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_url_disables_the_cache() {
        let cache = build_cache(None).expect("cache");
        assert!(matches!(cache, SessionCache::Disabled));
    }

    #[test]
    fn memory_scheme_selects_the_in_process_cache() {
        let cache = build_cache(Some("memory://")).expect("cache");
        assert!(matches!(cache, SessionCache::Memory(_)));
    }

    #[test]
    fn redis_url_builds_a_pool_without_connecting() {
        let cache = build_cache(Some("redis://127.0.0.1:6379")).expect("cache");
        assert!(matches!(cache, SessionCache::Redis(_)));
    }
}
