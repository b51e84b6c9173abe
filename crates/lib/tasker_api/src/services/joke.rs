//! External joke API client.

use reqwest::Client;
use tracing::warn;
use url::Url;

use crate::error::{AppError, AppResult};

/// Fetch one joke and return the upstream JSON unchanged.
///
/// Connection failures, timeouts (bounded by the client), non-2xx statuses
/// and non-JSON bodies all map to [`AppError::Upstream`].
pub async fn fetch_joke(client: &Client, url: &Url) -> AppResult<serde_json::Value> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(upstream_error)?;

    response.json().await.map_err(upstream_error)
}

fn upstream_error(e: reqwest::Error) -> AppError {
    warn!(error = %e, timeout = e.is_timeout(), "joke upstream failed");
    AppError::Upstream(e.to_string())
}
