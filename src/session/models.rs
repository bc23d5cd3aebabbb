use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Row, postgres::PgRow};
use uuid::Uuid;

/// Lifecycle state of a refresh session, derived from its row at read time.
///
/// Transitions are one-directional: `Active -> Revoked` on rotation or
/// logout, `Active -> Expired` by time passage. Nothing leaves `Revoked`
/// or `Expired`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Active,
    Expired,
    Revoked,
}

/// One issued refresh token, persisted in `refresh_sessions`.
///
/// Only the token fingerprint is stored; the opaque token exists in the
/// client cookie and momentarily in process memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_fingerprint: String,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl RefreshSession {
    /// Derive the session state as of `now`. Revocation wins over expiry.
    #[must_use]
    pub fn state_at(&self, now: DateTime<Utc>) -> SessionState {
        if self.revoked_at.is_some() {
            SessionState::Revoked
        } else if self.expires_at <= now {
            SessionState::Expired
        } else {
            SessionState::Active
        }
    }

    /// Whole seconds of lifetime left as of `now`, rounded down. Zero or
    /// negative means the session no longer belongs in the cache.
    #[must_use]
    pub fn remaining_ttl_seconds(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds()
    }
}

impl<'r> FromRow<'r, PgRow> for RefreshSession {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            token_fingerprint: row.try_get("token_fingerprint")?,
            expires_at: row.try_get("expires_at")?,
            revoked_at: row.try_get("revoked_at")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Fields needed to persist a new session; the store assigns `id` and
/// `created_at`.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: Uuid,
    pub token_fingerprint: String,
    pub expires_at: DateTime<Utc>,
}

/// Read-only projection of the user owning a session chain. The rotation
/// engine never mutates users.
#[derive(Debug, Clone)]
pub struct SessionOwner {
    pub id: Uuid,
    pub username: String,
    pub is_active: bool,
}
