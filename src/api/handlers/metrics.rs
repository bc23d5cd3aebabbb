//! Process metrics, gated behind a valid bearer access token.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use std::time::Instant;
use utoipa::ToSchema;

use crate::token::{AccessTokenIssuer, VerifyError};

/// Uptime and request counters, shared through an extension.
pub struct Metrics {
    started_at: Instant,
    requests: AtomicU64,
}

impl Metrics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            requests: AtomicU64::new(0),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MetricsResponse {
    pub uptime_seconds: u64,
    pub request_count: u64,
}

#[utoipa::path(
    get,
    path = "/metrics",
    responses(
        (status = 200, description = "Process metrics", body = MetricsResponse),
        (status = 401, description = "Missing, invalid or expired access token", body = String)
    ),
    tag = "metrics",
    security(("bearer" = []))
)]
pub async fn metrics(
    headers: HeaderMap,
    issuer: Extension<Arc<AccessTokenIssuer>>,
    metrics: Extension<Arc<Metrics>>,
) -> impl IntoResponse {
    let Some(token) = extract_bearer_token(&headers) else {
        return (StatusCode::UNAUTHORIZED, "Not authenticated".to_string()).into_response();
    };
    if let Err(err) = issuer.verify(&token) {
        let message = match err {
            VerifyError::Expired => "Token expired",
            VerifyError::Invalid => "Invalid token",
        };
        return (StatusCode::UNAUTHORIZED, message.to_string()).into_response();
    }

    let request_count = metrics.requests.fetch_add(1, Ordering::Relaxed) + 1;
    (
        StatusCode::OK,
        Json(MetricsResponse {
            uptime_seconds: metrics.started_at.elapsed().as_secs(),
            request_count,
        }),
    )
        .into_response()
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
