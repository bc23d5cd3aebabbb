//! Logout endpoint: revoke the refresh session and clear the cookie.
//!
//! Always reports success for present, unknown, and already-revoked tokens so
//! responses leak nothing about session existence.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::error;

use super::{cookie, state::AuthConfig, types::MessageResponse};
use crate::api::SharedEngine;

#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 503, description = "Session store unavailable", body = String)
    ),
    tag = "auth"
)]
pub async fn logout(
    headers: HeaderMap,
    engine: Extension<SharedEngine>,
    auth_config: Extension<Arc<AuthConfig>>,
) -> impl IntoResponse {
    if let Some(presented) = cookie::extract_refresh_token(&headers) {
        if let Err(err) = engine.revoke(&presented).await {
            error!("Failed to revoke session: {err}");
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service unavailable".to_string(),
            )
                .into_response();
        }
    }

    // Clear the cookie even when no token was presented.
    let mut response_headers = HeaderMap::new();
    if let Ok(value) = cookie::clear_refresh_cookie(&auth_config) {
        response_headers.insert(SET_COOKIE, value);
    }

    (
        StatusCode::OK,
        response_headers,
        Json(MessageResponse {
            message: "logged out".to_string(),
        }),
    )
        .into_response()
}
