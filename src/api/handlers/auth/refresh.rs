//! Refresh endpoint: verify the presented cookie and rotate the session.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::error;

use super::{cookie, state::AuthConfig, types::TokenResponse};
use crate::{
    api::SharedEngine,
    session::{engine::RotationError, store::StoreError},
    token::AccessTokenIssuer,
};

#[utoipa::path(
    post,
    path = "/refresh",
    responses(
        (status = 200, description = "Token rotated", body = TokenResponse),
        (status = 401, description = "Missing, invalid, revoked or expired refresh token", body = String),
        (status = 503, description = "Session store unavailable", body = String)
    ),
    tag = "auth"
)]
pub async fn refresh(
    headers: HeaderMap,
    engine: Extension<SharedEngine>,
    issuer: Extension<Arc<AccessTokenIssuer>>,
    auth_config: Extension<Arc<AuthConfig>>,
) -> impl IntoResponse {
    let Some(presented) = cookie::extract_refresh_token(&headers) else {
        return (
            StatusCode::UNAUTHORIZED,
            "Missing refresh token".to_string(),
        )
            .into_response();
    };

    // Rotation runs in its own task so a client disconnect cannot abandon a
    // half-finished rotation after the old session was revoked. If the cookie
    // is never delivered the successor stays orphaned server-side.
    let rotation_engine = engine.0.clone();
    let rotation =
        match tokio::spawn(async move { rotation_engine.rotate(&presented).await }).await {
            Ok(Ok(rotation)) => rotation,
            Ok(Err(err)) => return rotation_error_response(&err),
            Err(err) => {
                error!("Rotation task failed: {err}");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Refresh failed".to_string(),
                )
                    .into_response();
            }
        };

    let access_token = match issuer.issue(&rotation.user.username) {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to sign access token: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Refresh failed".to_string(),
            )
                .into_response();
        }
    };

    let mut response_headers = HeaderMap::new();
    match cookie::refresh_cookie(&auth_config, &rotation.token) {
        Ok(value) => {
            response_headers.insert(SET_COOKIE, value);
        }
        Err(err) => {
            error!("Failed to build refresh cookie: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Refresh failed".to_string(),
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

fn rotation_error_response(err: &RotationError) -> Response {
    let (status, message) = match err {
        RotationError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid refresh token"),
        RotationError::TokenRevoked => (StatusCode::UNAUTHORIZED, "Refresh token revoked"),
        RotationError::TokenExpired => (StatusCode::UNAUTHORIZED, "Refresh token expired"),
        RotationError::UserUnavailable => (StatusCode::UNAUTHORIZED, "User not available"),
        RotationError::Store(StoreError::Unavailable(reason)) => {
            error!("Session store unavailable: {reason}");
            (StatusCode::SERVICE_UNAVAILABLE, "Service unavailable")
        }
        RotationError::Store(StoreError::Duplicate) | RotationError::TokenGeneration => {
            error!("Rotation failed: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Refresh failed")
        }
    };
    (status, message.to_string()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_failures_map_to_unauthorized() {
        for err in [
            RotationError::InvalidToken,
            RotationError::TokenRevoked,
            RotationError::TokenExpired,
            RotationError::UserUnavailable,
        ] {
            let response = rotation_error_response(&err);
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn store_unavailability_is_not_an_auth_failure() {
        let err = RotationError::Store(StoreError::Unavailable("connection refused".to_string()));
        let response = rotation_error_response(&err);
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
