//! Registration endpoint.

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use sqlx::PgPool;
use tracing::error;

use super::auth::{
    storage::{RegisterOutcome, insert_user},
    types::{RegisterRequest, RegisterResponse},
};
use crate::password;

const MIN_PASSWORD_CHARS: usize = 6;
// Upper bound carried over from bcrypt-style hashing limits; also keeps
// attacker-supplied input to the hash function small.
const MAX_PASSWORD_BYTES: usize = 72;

fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Err("Password too long (max 72 bytes)");
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err("Password must be at least 6 characters");
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registration successful", body = RegisterResponse),
        (status = 400, description = "Validation error", body = String),
        (status = 409, description = "Username already exists", body = String),
        (status = 503, description = "Database unavailable", body = String)
    ),
    tag = "auth"
)]
pub async fn register(
    pool: Extension<PgPool>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let username = request.username.trim().to_string();
    if username.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            "Username cannot be empty".to_string(),
        )
            .into_response();
    }
    if let Err(message) = validate_password(&request.password) {
        return (StatusCode::BAD_REQUEST, message.to_string()).into_response();
    }

    let password_hash = match password::hash(&request.password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Failed to hash password: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Registration failed".to_string(),
            )
                .into_response();
        }
    };

    match insert_user(&pool, &username, &password_hash).await {
        Ok(RegisterOutcome::Created) => (
            StatusCode::OK,
            Json(RegisterResponse {
                message: "registered".to_string(),
                username,
            }),
        )
            .into_response(),
        Ok(RegisterOutcome::Conflict) => (
            StatusCode::CONFLICT,
            "Username already exists".to_string(),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to insert user: {err}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service unavailable".to_string(),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_passwords_are_rejected() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
    }

    #[test]
    fn byte_bound_is_enforced_before_length() {
        let exactly_72 = "a".repeat(72);
        assert!(validate_password(&exactly_72).is_ok());

        let too_long = "a".repeat(73);
        assert_eq!(
            validate_password(&too_long),
            Err("Password too long (max 72 bytes)")
        );
    }

    #[test]
    fn multibyte_passwords_count_bytes_and_chars_separately() {
        // 6 characters, 18 bytes: fine on both bounds.
        assert!(validate_password("猫猫猫猫猫猫").is_ok());
        // 25 characters but 75 bytes: byte bound wins.
        let wide = "猫".repeat(25);
        assert_eq!(
            validate_password(&wide),
            Err("Password too long (max 72 bytes)")
        );
    }
}
