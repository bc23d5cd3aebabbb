//! Durable session storage: the source of truth for refresh sessions.
//!
//! `PgSessionStore` is the production adapter; `MemorySessionStore` backs
//! tests and single-process development setups. Not-found is never an error,
//! and unavailability is kept distinct from uniqueness violations so callers
//! can tell a broken store from a fingerprint collision.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::{Instrument, info_span};
use uuid::Uuid;

use super::models::{NewSession, RefreshSession, SessionOwner};

/// Failure modes of the durable store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write (fingerprint already taken).
    #[error("duplicate key")]
    Duplicate,
    /// The store could not serve the request at all.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if is_unique_violation(&err) {
            Self::Duplicate
        } else {
            Self::Unavailable(err.to_string())
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

/// CRUD over refresh sessions plus the read-only owner lookup the rotation
/// engine needs to re-validate account status.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, session: NewSession) -> Result<RefreshSession, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<RefreshSession>, StoreError>;

    async fn find_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<RefreshSession>, StoreError>;

    /// Set `revoked_at` once. Revoking an already-revoked session is a no-op.
    async fn mark_revoked(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError>;

    async fn find_owner(&self, user_id: Uuid) -> Result<Option<SessionOwner>, StoreError>;
}

/// PostgreSQL-backed session store.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create(&self, session: NewSession) -> Result<RefreshSession, StoreError> {
        let query = r"
            INSERT INTO refresh_sessions (user_id, token_fingerprint, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, token_fingerprint, expires_at, revoked_at, created_at
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let row = sqlx::query_as::<_, RefreshSession>(query)
            .bind(session.user_id)
            .bind(&session.token_fingerprint)
            .bind(session.expires_at)
            .fetch_one(&self.pool)
            .instrument(span)
            .await?;
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<RefreshSession>, StoreError> {
        let query = r"
            SELECT id, user_id, token_fingerprint, expires_at, revoked_at, created_at
            FROM refresh_sessions
            WHERE id = $1
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query_as::<_, RefreshSession>(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;
        Ok(row)
    }

    async fn find_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<RefreshSession>, StoreError> {
        let query = r"
            SELECT id, user_id, token_fingerprint, expires_at, revoked_at, created_at
            FROM refresh_sessions
            WHERE token_fingerprint = $1
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query_as::<_, RefreshSession>(query)
            .bind(fingerprint)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;
        Ok(row)
    }

    async fn mark_revoked(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        // The IS NULL guard keeps revocation one-shot under racing rotations.
        let query = r"
            UPDATE refresh_sessions
            SET revoked_at = $2
            WHERE id = $1
              AND revoked_at IS NULL
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .instrument(span)
            .await?;
        Ok(())
    }

    async fn find_owner(&self, user_id: Uuid) -> Result<Option<SessionOwner>, StoreError> {
        let query = r"
            SELECT id, username, is_active
            FROM users
            WHERE id = $1
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;
        Ok(row.map(|row| SessionOwner {
            id: row.get("id"),
            username: row.get("username"),
            is_active: row.get("is_active"),
        }))
    }
}

/// In-process session store for tests and local development.
#[derive(Default)]
pub struct MemorySessionStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    sessions: HashMap<Uuid, RefreshSession>,
    users: HashMap<Uuid, SessionOwner>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user and return its id.
    pub fn add_user(&self, username: &str, is_active: bool) -> Uuid {
        let id = Uuid::new_v4();
        self.lock().users.insert(
            id,
            SessionOwner {
                id,
                username: username.to_string(),
                is_active,
            },
        );
        id
    }

    pub fn set_user_active(&self, user_id: Uuid, is_active: bool) {
        if let Some(user) = self.lock().users.get_mut(&user_id) {
            user.is_active = is_active;
        }
    }

    /// Force a session's expiry timestamp, so tests can age sessions without
    /// waiting.
    pub fn set_expires_at(&self, session_id: Uuid, expires_at: DateTime<Utc>) {
        if let Some(session) = self.lock().sessions.get_mut(&session_id) {
            session.expires_at = expires_at;
        }
    }

    /// All sessions belonging to a user, in creation order.
    pub fn sessions_for(&self, user_id: Uuid) -> Vec<RefreshSession> {
        let mut sessions: Vec<RefreshSession> = self
            .lock()
            .sessions
            .values()
            .filter(|session| session.user_id == user_id)
            .cloned()
            .collect();
        sessions.sort_by_key(|session| session.created_at);
        sessions
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, session: NewSession) -> Result<RefreshSession, StoreError> {
        let mut inner = self.lock();
        if inner
            .sessions
            .values()
            .any(|existing| existing.token_fingerprint == session.token_fingerprint)
        {
            return Err(StoreError::Duplicate);
        }
        let stored = RefreshSession {
            id: Uuid::new_v4(),
            user_id: session.user_id,
            token_fingerprint: session.token_fingerprint,
            expires_at: session.expires_at,
            revoked_at: None,
            created_at: Utc::now(),
        };
        inner.sessions.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<RefreshSession>, StoreError> {
        Ok(self.lock().sessions.get(&id).cloned())
    }

    async fn find_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<RefreshSession>, StoreError> {
        Ok(self
            .lock()
            .sessions
            .values()
            .find(|session| session.token_fingerprint == fingerprint)
            .cloned())
    }

    async fn mark_revoked(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        if let Some(session) = self.lock().sessions.get_mut(&id) {
            if session.revoked_at.is_none() {
                session.revoked_at = Some(at);
            }
        }
        Ok(())
    }

    async fn find_owner(&self, user_id: Uuid) -> Result<Option<SessionOwner>, StoreError> {
        Ok(self.lock().users.get(&user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &'static str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn unique_violation_maps_to_duplicate() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
        }));
        assert!(matches!(StoreError::from(err), StoreError::Duplicate));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("99999"),
        }));
        assert!(matches!(StoreError::from(err), StoreError::Unavailable(_)));

        let err = sqlx::Error::PoolTimedOut;
        assert!(matches!(StoreError::from(err), StoreError::Unavailable(_)));
    }

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemorySessionStore::new();
        let user_id = store.add_user("alice", true);

        let created = store
            .create(NewSession {
                user_id,
                token_fingerprint: "fp-1".to_string(),
                expires_at: Utc::now() + Duration::hours(1),
            })
            .await
            .expect("create");

        let by_id = store.find_by_id(created.id).await.expect("find");
        assert_eq!(by_id.map(|s| s.id), Some(created.id));

        let by_fp = store.find_by_fingerprint("fp-1").await.expect("find");
        assert_eq!(by_fp.map(|s| s.id), Some(created.id));

        let missing = store.find_by_fingerprint("fp-2").await.expect("find");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn memory_store_rejects_duplicate_fingerprints() {
        let store = MemorySessionStore::new();
        let user_id = store.add_user("alice", true);
        let session = NewSession {
            user_id,
            token_fingerprint: "fp-1".to_string(),
            expires_at: Utc::now() + Duration::hours(1),
        };

        store.create(session.clone()).await.expect("first create");
        let second = store.create(session).await;
        assert!(matches!(second, Err(StoreError::Duplicate)));
    }

    #[tokio::test]
    async fn mark_revoked_is_one_shot() {
        let store = MemorySessionStore::new();
        let user_id = store.add_user("alice", true);
        let created = store
            .create(NewSession {
                user_id,
                token_fingerprint: "fp-1".to_string(),
                expires_at: Utc::now() + Duration::hours(1),
            })
            .await
            .expect("create");

        let first_revocation = Utc::now();
        store
            .mark_revoked(created.id, first_revocation)
            .await
            .expect("revoke");
        store
            .mark_revoked(created.id, first_revocation + Duration::hours(1))
            .await
            .expect("revoke again");

        let stored = store
            .find_by_id(created.id)
            .await
            .expect("find")
            .expect("session");
        assert_eq!(stored.revoked_at, Some(first_revocation));
    }

    #[tokio::test]
    async fn find_owner_reflects_active_flag() {
        let store = MemorySessionStore::new();
        let user_id = store.add_user("alice", true);

        let owner = store
            .find_owner(user_id)
            .await
            .expect("find")
            .expect("owner");
        assert!(owner.is_active);

        store.set_user_active(user_id, false);
        let owner = store
            .find_owner(user_id)
            .await
            .expect("find")
            .expect("owner");
        assert!(!owner.is_active);

        let missing = store.find_owner(Uuid::new_v4()).await.expect("find");
        assert!(missing.is_none());
    }
}
