//! Tasker API server binary.
//!
//! `serve` (the default) runs the HTTP API; `grant-admin` promotes an
//! existing user and exits.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tasker_api::config::{self, ApiConfig};
use tasker_core::models::auth::Role;
use tasker_core::ratelimit::{CounterStore, MemoryCounterStore, RateLimiter, RedisCounterStore};
use tracing::{info, warn};
use url::Url;

/// Counter store URL value selecting the in-process store.
const MEMORY_STORE: &str = "memory";

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "tasker_server", about = "Tasker task management API server")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Address to bind the HTTP listener.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:8000")]
    bind_addr: String,

    /// sqlx database URL.
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://tasks.db")]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 5)]
    max_connections: u32,

    /// Rate-limit counter store URL (`memory` for a single-process store).
    #[arg(long, env = "REDIS_URL", default_value = "redis://localhost:6379/0")]
    redis_url: String,

    /// JWT signing secret. Falls back to a development key.
    #[arg(long, env = "JWT_SECRET_KEY", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Access token lifetime in minutes.
    #[arg(long, env = "ACCESS_TOKEN_EXPIRE_MINUTES", default_value_t = 60)]
    token_ttl_minutes: i64,

    /// Requests admitted per client per window.
    #[arg(long, env = "RATE_LIMIT", default_value_t = 5)]
    rate_limit: u64,

    /// Rate-limit window in seconds.
    #[arg(long, env = "RATE_PERIOD", default_value_t = 60)]
    rate_window_secs: u64,

    /// Joke proxy upstream.
    #[arg(long, env = "JOKE_API_URL", default_value = config::DEFAULT_JOKE_API_URL)]
    joke_api_url: Url,

    /// Timeout for outbound HTTP calls, in seconds.
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value_t = 5)]
    upstream_timeout_secs: u64,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default).
    Serve,
    /// Give an existing user the admin role.
    GrantAdmin {
        /// Username to promote.
        username: String,
    },
}

impl Args {
    fn api_config(&self) -> ApiConfig {
        ApiConfig {
            bind_addr: self.bind_addr.clone(),
            database_url: self.database_url.clone(),
            redis_url: self.redis_url.clone(),
            jwt_secret: config::resolve_jwt_secret(self.jwt_secret.clone()),
            token_ttl_minutes: self.token_ttl_minutes,
            rate_limit: self.rate_limit,
            rate_window: Duration::from_secs(self.rate_window_secs),
            joke_api_url: self.joke_api_url.clone(),
            upstream_timeout: Duration::from_secs(self.upstream_timeout_secs),
        }
    }
}

fn init_tracing(format: LogFormat) -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info,tasker_api=debug,tasker_core=debug"))?;

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
    Ok(())
}

fn counter_store(redis_url: &str) -> Result<Arc<dyn CounterStore>, Box<dyn std::error::Error>> {
    if redis_url == MEMORY_STORE {
        warn!("using in-process rate-limit counters; limits are not shared between instances");
        return Ok(Arc::new(MemoryCounterStore::new()));
    }
    Ok(Arc::new(RedisCounterStore::open(redis_url)?))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(args.log_format)?;

    let config = args.api_config();

    info!(max_connections = args.max_connections, "connecting to database");
    let pool = tasker_core::db::connect(&config.database_url, args.max_connections).await?;

    if let Some(Command::GrantAdmin { username }) = &args.command {
        if tasker_core::auth::queries::set_user_role(&pool, username, Role::Admin).await? {
            info!(username = %username, "granted admin role");
        } else {
            warn!(username = %username, "no such user");
        }
        pool.close().await;
        return Ok(());
    }

    let store = counter_store(&config.redis_url)?;
    let limiter = RateLimiter::new(store, config.rate_limit, config.rate_window);
    info!(
        limit = config.rate_limit,
        window_secs = config.rate_window.as_secs(),
        "rate limiter configured"
    );

    let bind_addr = config.bind_addr.clone();
    let state = tasker_api::AppState::new(pool.clone(), config, limiter)?;
    let app = tasker_api::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, "REST API listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    pool.close().await;
    info!("server stopped");
    Ok(())
}
