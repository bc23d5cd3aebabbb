//! Database helpers for user accounts.
//!
//! Refresh sessions live behind [`crate::session::SessionStore`]; the handlers
//! here only need user rows for registration and credential checks.

use sqlx::{PgPool, Row};
use tracing::{Instrument, info_span};
use uuid::Uuid;

use crate::session::store::StoreError;

/// Outcome of attempting to create a user.
#[derive(Debug)]
pub(crate) enum RegisterOutcome {
    Created,
    Conflict,
}

/// Fields needed to check credentials at login.
pub(crate) struct UserRecord {
    pub(crate) id: Uuid,
    pub(crate) username: String,
    pub(crate) password_hash: String,
    pub(crate) is_active: bool,
}

pub(crate) async fn find_user_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<UserRecord>, StoreError> {
    let query = r"
        SELECT id, username, password_hash, is_active
        FROM users
        WHERE username = $1
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .fetch_optional(pool)
        .instrument(span)
        .await?;
    Ok(row.map(|row| UserRecord {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        is_active: row.get("is_active"),
    }))
}

pub(crate) async fn insert_user(
    pool: &PgPool,
    username: &str,
    password_hash: &str,
) -> Result<RegisterOutcome, StoreError> {
    let query = r"
        INSERT INTO users (username, password_hash, is_active)
        VALUES ($1, $2, TRUE)
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(username)
        .bind(password_hash)
        .execute(pool)
        .instrument(span)
        .await;

    match result {
        Ok(_) => Ok(RegisterOutcome::Created),
        Err(err) => match StoreError::from(err) {
            StoreError::Duplicate => Ok(RegisterOutcome::Conflict),
            err => Err(err),
        },
    }
}
