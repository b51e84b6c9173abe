//! Per-client-IP rate limiting middleware.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use tasker_core::ratelimit::Decision;

use crate::AppState;
use crate::error::AppError;

pub const RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

/// Counts the request against the peer IP's window.
///
/// Requests without a known peer address (no `ConnectInfo`) are not
/// limited. A counter store failure admits the request.
pub async fn enforce_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(ConnectInfo(peer)) = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .copied()
    else {
        return Ok(next.run(request).await);
    };

    match state.limiter.check(&peer.ip().to_string()).await {
        Decision::Admit { limit, remaining } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(limit));
            headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(remaining));
            Ok(response)
        }
        Decision::Reject { limit, retry_after } => {
            Err(AppError::RateLimited { limit, retry_after })
        }
        Decision::Bypass => Ok(next.run(request).await),
    }
}
