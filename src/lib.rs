//! # Pordisto (Authentication Service)
//!
//! `pordisto` is an authentication service built around a refresh-token
//! rotation protocol: registration, login, refresh, and logout backed by
//! PostgreSQL with an optional Redis cache.
//!
//! ## Refresh Sessions
//!
//! Every login issues an opaque, 256-bit random refresh token delivered in an
//! `HttpOnly` cookie. The database stores only a SHA-256 fingerprint of the
//! token, never its plaintext. Each refresh atomically rotates the session:
//! the presented session is durably revoked before its successor exists, so
//! an old token can never be replayed into a working session.
//!
//! - **Dual-store lookup:** the cache (fingerprint to session id) is a
//!   best-effort fast path; the durable store is authoritative and every
//!   flow is correct with the cache disabled or unreachable.
//! - **Explicit states:** sessions are `Active`, `Expired`, or `Revoked`,
//!   derived from `revoked_at` / `expires_at` at read time.
//! - **Idempotent logout:** revoking an unknown or already-revoked token is
//!   reported as success, so responses never leak session existence.
//!
//! ## Access Tokens
//!
//! Short-lived HS256 JWTs minted on login and refresh. Verification is
//! offline; the refresh session alone decides whether a new one is issued.

pub mod api;
pub mod cli;
pub mod password;
pub mod session;
pub mod token;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        // Should be a hex string (full SHA-1 is 40 chars, but could be short)
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
