//! # tasker_api
//!
//! HTTP API library for Tasker.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::any::Any;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use sqlx::SqlitePool;
use tasker_core::ratelimit::RateLimiter;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ApiConfig;
use crate::error::AppError;
use crate::handlers::{auth, health, joke, tasks};
use crate::middleware::{Guard, guarded};

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// SQLite connection pool.
    pub pool: SqlitePool,
    /// API configuration, fixed at startup.
    pub config: Arc<ApiConfig>,
    /// Per-client request limiter.
    pub limiter: Arc<RateLimiter>,
    /// Outbound HTTP client with the upstream timeout applied.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(
        pool: SqlitePool,
        config: ApiConfig,
        limiter: RateLimiter,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()?;
        Ok(Self {
            pool,
            config: Arc::new(config),
            limiter: Arc::new(limiter),
            http,
        })
    }
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    // Public routes (no guards)
    let public = Router::new()
        .route(routes::POST_AUTH_REGISTER, post(auth::register_handler))
        .route(routes::POST_AUTH_LOGIN, post(auth::login_handler));

    let admin = guarded(
        Router::new().route(routes::GET_AUTH_ADMIN, get(auth::admin_handler)),
        &state,
        &[Guard::Auth, Guard::Admin],
    );

    let task_routes = guarded(
        Router::new()
            .route(
                routes::TASKS,
                post(tasks::create_task_handler).get(tasks::list_tasks_handler),
            )
            .route(routes::GET_TASKS_EXTERNAL_JOKE, get(joke::external_joke_handler))
            .route(
                routes::TASKS_ID,
                get(tasks::get_task_handler)
                    .put(tasks::update_task_handler)
                    .delete(tasks::delete_task_handler),
            ),
        &state,
        &[Guard::RateLimit, Guard::Auth],
    );

    let v1 = Router::new().merge(public).merge(admin).merge(task_routes);

    let layers = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get(REQUEST_ID_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        path = %request.uri().path(),
                        request_id = %request_id,
                    )
                })
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors);

    Router::new()
        .route(routes::GET_HEALTH, get(health::health_handler))
        .route(routes::GET_HEALTH_DETAILED, get(health::detailed_health_handler))
        .nest(routes::API_PREFIX, v1)
        .layer(layers)
        .with_state(state)
}

/// Turns a handler panic into a plain 500 without leaking the payload.
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    AppError::Internal(format!("handler panicked: {detail}")).into_response()
}
