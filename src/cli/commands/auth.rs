use clap::{Arg, Command, builder::ValueParser};

use crate::api::handlers::auth::CookieSameSite;

#[must_use]
pub fn validator_same_site() -> ValueParser {
    ValueParser::from(
        move |value: &str| -> std::result::Result<CookieSameSite, String> {
            CookieSameSite::parse(value)
        },
    )
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    let command = with_token_args(command);
    with_cookie_args(command)
}

fn with_token_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("jwt-secret")
                .long("jwt-secret")
                .help("Shared secret for signing access tokens")
                .env("PORDISTO_JWT_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new("access-token-ttl-seconds")
                .long("access-token-ttl-seconds")
                .help("Access token TTL in seconds")
                .env("PORDISTO_ACCESS_TOKEN_TTL_SECONDS")
                .default_value("900")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("refresh-ttl-seconds")
                .long("refresh-ttl-seconds")
                .help("Refresh session TTL in seconds")
                .env("PORDISTO_REFRESH_TTL_SECONDS")
                .default_value("604800")
                .value_parser(clap::value_parser!(i64)),
        )
}

fn with_cookie_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("cookie-secure")
                .long("cookie-secure")
                .help("Set the Secure attribute on the refresh cookie")
                .env("PORDISTO_COOKIE_SECURE")
                .default_value("false")
                .value_parser(clap::value_parser!(bool)),
        )
        .arg(
            Arg::new("cookie-samesite")
                .long("cookie-samesite")
                .help("SameSite attribute for the refresh cookie: lax, strict or none")
                .env("PORDISTO_COOKIE_SAMESITE")
                .default_value("lax")
                .value_parser(validator_same_site()),
        )
        .arg(
            Arg::new("frontend-base-url")
                .long("frontend-base-url")
                .help("Frontend origin allowed for credentialed CORS")
                .env("PORDISTO_FRONTEND_BASE_URL")
                .default_value("http://localhost:5173"),
        )
}
