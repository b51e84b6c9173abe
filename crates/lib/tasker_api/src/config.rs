//! API server configuration.

use std::time::Duration;

use tracing::warn;
use url::Url;

/// Signing secret used when none is configured. Local development only.
pub const DEV_JWT_SECRET: &str = "super-secret-dev-key";

/// Default upstream for the joke proxy.
pub const DEFAULT_JOKE_API_URL: &str = "https://official-joke-api.appspot.com/random_joke";

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:8000").
    pub bind_addr: String,
    /// sqlx database URL.
    pub database_url: String,
    /// Counter store URL; `memory` selects the in-process store.
    pub redis_url: String,
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Access token lifetime.
    pub token_ttl_minutes: i64,
    /// Requests admitted per client per window.
    pub rate_limit: u64,
    /// Rate-limit window length.
    pub rate_window: Duration,
    /// Joke proxy upstream.
    pub joke_api_url: Url,
    /// Timeout for outbound HTTP calls.
    pub upstream_timeout: Duration,
}

impl Default for ApiConfig {
    /// Local development defaults.
    ///
    /// | Field               | Default                                             |
    /// |---------------------|-----------------------------------------------------|
    /// | `bind_addr`         | `127.0.0.1:8000`                                    |
    /// | `database_url`      | `sqlite://tasks.db`                                 |
    /// | `redis_url`         | `redis://localhost:6379/0`                          |
    /// | `jwt_secret`        | `super-secret-dev-key`                              |
    /// | `token_ttl_minutes` | `60`                                                |
    /// | `rate_limit`        | `5` per `60s`                                       |
    /// | `joke_api_url`      | `https://official-joke-api.appspot.com/random_joke` |
    /// | `upstream_timeout`  | `5s`                                                |
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".into(),
            database_url: "sqlite://tasks.db".into(),
            redis_url: "redis://localhost:6379/0".into(),
            jwt_secret: DEV_JWT_SECRET.into(),
            token_ttl_minutes: tasker_core::auth::jwt::DEFAULT_TOKEN_TTL_MINUTES,
            rate_limit: tasker_core::ratelimit::DEFAULT_LIMIT,
            rate_window: tasker_core::ratelimit::DEFAULT_WINDOW,
            joke_api_url: Url::parse(DEFAULT_JOKE_API_URL).expect("default joke URL is valid"),
            upstream_timeout: Duration::from_secs(5),
        }
    }
}

/// Use the configured JWT secret (`--jwt-secret` / `JWT_SECRET_KEY`), or
/// the development default when it is unset or empty.
pub fn resolve_jwt_secret(configured: Option<String>) -> String {
    if let Some(secret) = configured
        && !secret.is_empty()
    {
        return secret;
    }
    warn!("no JWT secret configured, using the development default");
    DEV_JWT_SECRET.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ApiConfig::default();
        assert_eq!(config.rate_limit, 5);
        assert_eq!(config.rate_window, Duration::from_secs(60));
        assert_eq!(config.token_ttl_minutes, 60);
        assert_eq!(config.joke_api_url.as_str(), DEFAULT_JOKE_API_URL);
    }

    #[test]
    fn configured_secret_wins() {
        assert_eq!(resolve_jwt_secret(Some("from-flag".into())), "from-flag");
    }

    #[test]
    fn missing_or_empty_secret_falls_back_to_dev_key() {
        assert_eq!(resolve_jwt_secret(None), DEV_JWT_SECRET);
        assert_eq!(resolve_jwt_secret(Some(String::new())), DEV_JWT_SECRET);
    }
}
