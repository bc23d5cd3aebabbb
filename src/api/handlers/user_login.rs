//! Login endpoint: credential check, refresh session issuance, access token.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::IntoResponse,
};
use sqlx::PgPool;
use std::sync::{Arc, OnceLock};
use tracing::error;

use super::auth::{
    AuthConfig, cookie,
    storage::find_user_by_username,
    types::{LoginRequest, TokenResponse},
};
use crate::{
    api::SharedEngine,
    password,
    session::{engine::RotationError, store::StoreError},
    token::AccessTokenIssuer,
};

// Verified against when the username is unknown, so lookup misses cost the
// same as a real password check.
static DUMMY_HASH: OnceLock<String> = OnceLock::new();

fn dummy_hash() -> &'static str {
    DUMMY_HASH.get_or_init(|| password::hash("pordisto-dummy-credential").unwrap_or_default())
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid username or password", body = String),
        (status = 403, description = "User is inactive", body = String),
        (status = 503, description = "Database unavailable", body = String)
    ),
    tag = "auth"
)]
pub async fn login(
    pool: Extension<PgPool>,
    engine: Extension<SharedEngine>,
    issuer: Extension<Arc<AccessTokenIssuer>>,
    auth_config: Extension<Arc<AuthConfig>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let username = request.username.trim();
    let user = match find_user_by_username(&pool, username).await {
        Ok(user) => user,
        Err(err) => {
            error!("Failed to lookup user: {err}");
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service unavailable".to_string(),
            )
                .into_response();
        }
    };

    // Unknown users and wrong passwords are indistinguishable to the caller.
    let Some(user) = user else {
        let _ = password::verify(&request.password, dummy_hash());
        return (
            StatusCode::UNAUTHORIZED,
            "Invalid username or password".to_string(),
        )
            .into_response();
    };
    if !password::verify(&request.password, &user.password_hash) {
        return (
            StatusCode::UNAUTHORIZED,
            "Invalid username or password".to_string(),
        )
            .into_response();
    }
    if !user.is_active {
        return (StatusCode::FORBIDDEN, "User is inactive".to_string()).into_response();
    }

    let issued = match engine.issue(user.id).await {
        Ok(issued) => issued,
        Err(RotationError::Store(StoreError::Unavailable(reason))) => {
            error!("Session store unavailable: {reason}");
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service unavailable".to_string(),
            )
                .into_response();
        }
        Err(err) => {
            error!("Failed to issue refresh session: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Login failed".to_string(),
            )
                .into_response();
        }
    };

    let access_token = match issuer.issue(&user.username) {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to sign access token: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Login failed".to_string(),
            )
                .into_response();
        }
    };

    let mut response_headers = HeaderMap::new();
    match cookie::refresh_cookie(&auth_config, &issued.token) {
        Ok(value) => {
            response_headers.insert(SET_COOKIE, value);
        }
        Err(err) => {
            error!("Failed to build refresh cookie: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Login failed".to_string(),
            )
                .into_response();
        }
    }

    (
        StatusCode::OK,
        response_headers,
        Json(TokenResponse::bearer(access_token)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dummy_hash_is_a_valid_argon2_hash() {
        let hash = dummy_hash();
        assert!(hash.starts_with("$argon2id$"));
        assert!(password::verify("pordisto-dummy-credential", hash));
        assert!(!password::verify("anything-else", hash));
    }
}
