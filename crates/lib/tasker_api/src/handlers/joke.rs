//! External joke proxy handler.

use axum::Json;
use axum::extract::State;

use crate::AppState;
use crate::error::AppResult;
use crate::services::joke;

/// `GET /tasks/external-joke`: relay a random joke from the upstream API.
pub async fn external_joke_handler(
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let body = joke::fetch_joke(&state.http, &state.config.joke_api_url).await?;
    Ok(Json(body))
}
