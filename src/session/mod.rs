//! Refresh session lifecycle: models, token codec, store and cache adapters,
//! and the rotation engine.
//!
//! The durable store is the source of truth; the cache is a best-effort
//! accelerator whose absence or failure never affects correctness.

pub mod cache;
pub mod engine;
pub mod models;
pub mod store;
pub mod token;

pub use cache::SessionCache;
pub use engine::RotationEngine;
pub use store::{MemorySessionStore, PgSessionStore, SessionStore};
