//! Command-line argument dispatch and server initialization.
//!
//! This module maps validated CLI arguments to the appropriate action, such
//! as starting the API server with its full configuration.

use crate::api::handlers::auth::CookieSameSite;
use crate::cli::actions::{Action, server::Args};
use anyhow::{Context, Result};
use secrecy::SecretString;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;
    let jwt_secret = matches
        .get_one::<String>("jwt-secret")
        .cloned()
        .context("missing required argument: --jwt-secret")?;

    Ok(Action::Server(Args {
        port,
        dsn,
        cache_url: matches.get_one::<String>("cache-url").cloned(),
        jwt_secret: SecretString::from(jwt_secret),
        access_token_ttl_seconds: matches
            .get_one::<i64>("access-token-ttl-seconds")
            .copied()
            .unwrap_or(900),
        refresh_ttl_seconds: matches
            .get_one::<i64>("refresh-ttl-seconds")
            .copied()
            .unwrap_or(604_800),
        cookie_secure: matches
            .get_one::<bool>("cookie-secure")
            .copied()
            .unwrap_or(false),
        cookie_same_site: matches
            .get_one::<CookieSameSite>("cookie-samesite")
            .copied()
            .unwrap_or(CookieSameSite::Lax),
        frontend_base_url: matches
            .get_one::<String>("frontend-base-url")
            .cloned()
            .unwrap_or_else(|| "http://localhost:5173".to_string()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_backed_arguments_build_a_server_action() {
        temp_env::with_vars(
            [
                (
                    "PORDISTO_DSN",
                    Some("postgres://user@localhost:5432/pordisto"),
                ),
                ("PORDISTO_JWT_SECRET", Some("test-secret")),
                ("PORDISTO_CACHE_URL", Some("redis://127.0.0.1:6379")),
                ("PORDISTO_COOKIE_SAMESITE", Some("strict")),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec!["pordisto"]);
                let action = handler(&matches).expect("handler");
                let Action::Server(args) = action;
                assert_eq!(args.port, 8080);
                assert_eq!(args.dsn, "postgres://user@localhost:5432/pordisto");
                assert_eq!(args.cache_url.as_deref(), Some("redis://127.0.0.1:6379"));
                assert_eq!(args.cookie_same_site, CookieSameSite::Strict);
                assert!(!args.cookie_secure);
                assert_eq!(args.refresh_ttl_seconds, 604_800);
            },
        );
    }

    #[test]
    fn jwt_secret_is_required() {
        temp_env::with_vars(
            [
                (
                    "PORDISTO_DSN",
                    Some("postgres://user@localhost:5432/pordisto"),
                ),
                ("PORDISTO_JWT_SECRET", None::<&str>),
            ],
            || {
                let command = crate::cli::commands::new();
                let result = command.try_get_matches_from(vec!["pordisto"]);
                assert!(result.is_err());
            },
        );
    }
}
