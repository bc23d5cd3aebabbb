//! The rotation engine: issue, verify+rotate, and revoke refresh sessions.
//!
//! The engine coordinates the durable store and the cache with a fixed
//! fallback order (cache first, store authoritative) and never encodes HTTP
//! semantics; callers map [`RotationError`] to their transport.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::cache::SessionCache;
use super::models::{NewSession, RefreshSession, SessionOwner, SessionState};
use super::store::{SessionStore, StoreError};
use super::token;

/// Attempts to find an unused fingerprint before giving up. Collisions on
/// 256-bit random tokens are effectively impossible, so more than one pass
/// means something else is wrong.
const ISSUE_ATTEMPTS: usize = 3;

/// Typed outcome of a failed verify+rotate.
#[derive(Debug, thiserror::Error)]
pub enum RotationError {
    /// No session matches the presented token's fingerprint.
    #[error("invalid refresh token")]
    InvalidToken,
    /// The matching session was already revoked (rotation or logout).
    #[error("refresh token revoked")]
    TokenRevoked,
    /// The matching session's expiry has passed.
    #[error("refresh token expired")]
    TokenExpired,
    /// Rotation succeeded but the owning account is gone or inactive. The
    /// old token is burned anyway; the replacement is never handed out.
    #[error("user not available")]
    UserUnavailable,
    /// Could not produce a token with an unused fingerprint.
    #[error("token generation failed")]
    TokenGeneration,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A freshly issued refresh token, plaintext still in hand.
#[derive(Debug)]
pub struct IssuedToken {
    pub token: String,
    pub session: RefreshSession,
}

/// Result of a successful rotation: the successor token plus the owner the
/// caller needs to mint an access token.
#[derive(Debug)]
pub struct Rotation {
    pub token: String,
    pub session: RefreshSession,
    pub user: SessionOwner,
}

pub struct RotationEngine<S> {
    store: S,
    cache: SessionCache,
    refresh_ttl: Duration,
}

impl<S: SessionStore> RotationEngine<S> {
    #[must_use]
    pub fn new(store: S, cache: SessionCache, refresh_ttl_seconds: i64) -> Self {
        Self {
            store,
            cache,
            refresh_ttl: Duration::seconds(refresh_ttl_seconds),
        }
    }

    /// Issue a new refresh session for `user_id` and return the opaque token
    /// for transport delivery.
    ///
    /// The session is durable before the cache is touched; a failed cache
    /// write never aborts issuance.
    ///
    /// # Errors
    /// Returns [`RotationError::Store`] if the durable write fails, or
    /// [`RotationError::TokenGeneration`] if no unused fingerprint could be
    /// produced.
    pub async fn issue(&self, user_id: Uuid) -> Result<IssuedToken, RotationError> {
        self.issue_at(user_id, Utc::now()).await
    }

    async fn issue_at(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, RotationError> {
        for _ in 0..ISSUE_ATTEMPTS {
            let opaque = token::generate().map_err(|_| RotationError::TokenGeneration)?;
            let fingerprint = token::fingerprint(&opaque);
            let new_session = NewSession {
                user_id,
                token_fingerprint: fingerprint.clone(),
                expires_at: now + self.refresh_ttl,
            };
            match self.store.create(new_session).await {
                Ok(session) => {
                    let ttl = u64::try_from(session.remaining_ttl_seconds(now)).unwrap_or(0);
                    self.cache.set(&fingerprint, session.id, ttl).await;
                    return Ok(IssuedToken {
                        token: opaque,
                        session,
                    });
                }
                // Fingerprint taken; a fresh token gets a fresh fingerprint.
                Err(StoreError::Duplicate) => {}
                Err(err) => return Err(err.into()),
            }
        }
        Err(RotationError::TokenGeneration)
    }

    /// Verify a presented token and atomically rotate it: the old session is
    /// durably revoked before the successor token exists, so no overlapping
    /// validity window ever reaches a client.
    ///
    /// # Errors
    /// Returns the typed verification failure, [`RotationError::Store`] on
    /// store trouble, or [`RotationError::UserUnavailable`] when the owner is
    /// no longer active (the old token is burned regardless).
    pub async fn rotate(&self, presented: &str) -> Result<Rotation, RotationError> {
        let fingerprint = token::fingerprint(presented);
        let now = Utc::now();

        // Fast path: the cache maps fingerprints to session ids.
        let mut session = match self.cache.get(&fingerprint).await {
            Some(session_id) => self.store.find_by_id(session_id).await?,
            None => None,
        };

        // Fallback: authoritative lookup, covering cache eviction or restart.
        if session.is_none() {
            session = self.store.find_by_fingerprint(&fingerprint).await?;
            if let Some(found) = &session {
                if found.state_at(now) == SessionState::Active {
                    let remaining = u64::try_from(found.remaining_ttl_seconds(now)).unwrap_or(0);
                    self.cache.set(&fingerprint, found.id, remaining).await;
                }
            }
        }

        let Some(session) = session else {
            return Err(RotationError::InvalidToken);
        };

        match session.state_at(now) {
            SessionState::Revoked => return Err(RotationError::TokenRevoked),
            SessionState::Expired => {
                // Store expiry is authoritative; drop any stale cache entry.
                self.cache.delete(&fingerprint).await;
                return Err(RotationError::TokenExpired);
            }
            SessionState::Active => {}
        }

        // Durable revoke first, then the successor.
        self.store.mark_revoked(session.id, now).await?;
        self.cache.delete(&fingerprint).await;

        let issued = self.issue_at(session.user_id, now).await?;

        // Re-validate the owner last. An inactive owner means the old token
        // is intentionally burned and the successor is never returned, so a
        // revoked token cannot be replayed into a working session.
        let owner = self.store.find_owner(session.user_id).await?;
        match owner {
            Some(user) if user.is_active => Ok(Rotation {
                token: issued.token,
                session: issued.session,
                user,
            }),
            _ => Err(RotationError::UserUnavailable),
        }
    }

    /// Revoke the session matching a presented token, if any. Idempotent:
    /// unknown and already-revoked tokens are success, and the cache entry is
    /// dropped regardless of the lookup outcome.
    ///
    /// # Errors
    /// Returns an error only when the durable store is unreachable.
    pub async fn revoke(&self, presented: &str) -> Result<(), StoreError> {
        let fingerprint = token::fingerprint(presented);
        if let Some(session) = self.store.find_by_fingerprint(&fingerprint).await? {
            if session.revoked_at.is_none() {
                self.store.mark_revoked(session.id, Utc::now()).await?;
            }
        }
        self.cache.delete(&fingerprint).await;
        Ok(())
    }
}
