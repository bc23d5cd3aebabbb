//! Best-effort cache of active sessions: `fingerprint -> session_id`.
//!
//! The cache is a derived, non-authoritative projection of the store. Every
//! operation tolerates a missing or unreachable backend: connectivity errors
//! are logged and swallowed, reads degrade to a miss, and absence of an entry
//! never means the session is invalid.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use deadpool_redis::Pool;
use tracing::warn;
use uuid::Uuid;

const KEY_PREFIX: &str = "rt:";

/// Cache backend selection. `Disabled` means every operation is a no-op or
/// a miss; `Memory` is a single-instance in-process map; `Redis` is the
/// shared multi-instance backend.
#[derive(Clone)]
pub enum SessionCache {
    Disabled,
    Memory(Arc<DashMap<String, MemoryEntry>>),
    Redis(Pool),
}

/// An in-process cache entry with its own TTL bookkeeping.
#[derive(Clone, Debug)]
pub struct MemoryEntry {
    session_id: Uuid,
    inserted_at: Instant,
    ttl: Duration,
}

impl MemoryEntry {
    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() >= self.ttl
    }
}

/// Connectivity status reported by the readiness probe. A disabled cache is
/// healthy; only a configured-but-unreachable backend is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Ok,
    NotConfigured,
    Error,
}

impl CacheStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::NotConfigured => "not_configured",
            Self::Error => "error",
        }
    }

    #[must_use]
    pub const fn is_healthy(self) -> bool {
        !matches!(self, Self::Error)
    }
}

impl SessionCache {
    #[must_use]
    pub fn disabled() -> Self {
        Self::Disabled
    }

    #[must_use]
    pub fn memory() -> Self {
        Self::Memory(Arc::new(DashMap::new()))
    }

    #[must_use]
    pub fn redis(pool: Pool) -> Self {
        Self::Redis(pool)
    }

    fn key(fingerprint: &str) -> String {
        format!("{KEY_PREFIX}{fingerprint}")
    }

    /// Store a `fingerprint -> session_id` mapping with a TTL. A zero TTL is
    /// skipped entirely; the entry would be dead on arrival.
    pub async fn set(&self, fingerprint: &str, session_id: Uuid, ttl_seconds: u64) {
        if ttl_seconds == 0 {
            return;
        }
        match self {
            Self::Disabled => {}
            Self::Memory(map) => {
                map.insert(
                    Self::key(fingerprint),
                    MemoryEntry {
                        session_id,
                        inserted_at: Instant::now(),
                        ttl: Duration::from_secs(ttl_seconds),
                    },
                );
            }
            Self::Redis(pool) => {
                let key = Self::key(fingerprint);
                match pool.get().await {
                    Ok(mut conn) => {
                        let result: Result<(), redis::RedisError> = redis::AsyncCommands::set_ex(
                            &mut conn,
                            &key,
                            session_id.to_string(),
                            ttl_seconds,
                        )
                        .await;
                        if let Err(err) = result {
                            warn!("cache SET failed: {err}");
                        }
                    }
                    Err(err) => warn!("cache connection failed: {err}"),
                }
            }
        }
    }

    /// Look up a session id by fingerprint. Any backend failure reads as a
    /// miss.
    pub async fn get(&self, fingerprint: &str) -> Option<Uuid> {
        match self {
            Self::Disabled => None,
            Self::Memory(map) => {
                let key = Self::key(fingerprint);
                if let Some(entry) = map.get(&key) {
                    if entry.is_expired() {
                        drop(entry);
                        map.remove(&key);
                        return None;
                    }
                    return Some(entry.session_id);
                }
                None
            }
            Self::Redis(pool) => {
                let key = Self::key(fingerprint);
                match pool.get().await {
                    Ok(mut conn) => {
                        let value: Result<Option<String>, redis::RedisError> =
                            redis::AsyncCommands::get(&mut conn, &key).await;
                        match value {
                            Ok(value) => value.and_then(|raw| Uuid::parse_str(&raw).ok()),
                            Err(err) => {
                                warn!("cache GET failed: {err}");
                                None
                            }
                        }
                    }
                    Err(err) => {
                        warn!("cache connection failed: {err}");
                        None
                    }
                }
            }
        }
    }

    /// Drop a fingerprint from the cache. Deleting an absent key is fine.
    pub async fn delete(&self, fingerprint: &str) {
        match self {
            Self::Disabled => {}
            Self::Memory(map) => {
                map.remove(&Self::key(fingerprint));
            }
            Self::Redis(pool) => {
                let key = Self::key(fingerprint);
                match pool.get().await {
                    Ok(mut conn) => {
                        let result: Result<(), redis::RedisError> =
                            redis::AsyncCommands::del(&mut conn, &key).await;
                        if let Err(err) = result {
                            warn!("cache DEL failed: {err}");
                        }
                    }
                    Err(err) => warn!("cache connection failed: {err}"),
                }
            }
        }
    }

    /// Connectivity check for the readiness probe.
    pub async fn status(&self) -> CacheStatus {
        match self {
            Self::Disabled => CacheStatus::NotConfigured,
            Self::Memory(_) => CacheStatus::Ok,
            Self::Redis(pool) => match pool.get().await {
                Ok(mut conn) => {
                    let pong: Result<String, redis::RedisError> =
                        redis::cmd("PING").query_async(&mut conn).await;
                    match pong {
                        Ok(_) => CacheStatus::Ok,
                        Err(err) => {
                            warn!("cache PING failed: {err}");
                            CacheStatus::Error
                        }
                    }
                }
                Err(err) => {
                    warn!("cache connection failed: {err}");
                    CacheStatus::Error
                }
            },
        }
    }
}
