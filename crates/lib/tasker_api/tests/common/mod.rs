//! Shared fixtures: an in-memory app plus request helpers.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use sqlx::SqlitePool;
use tasker_api::{AppState, config::ApiConfig};
use tasker_core::ratelimit::{CounterStore, MemoryCounterStore, RateLimiter};
use tower::ServiceExt;

pub const PASSWORD: &str = "strongpassword123";

pub struct TestApp {
    pub app: Router,
    pub pool: SqlitePool,
    pub config: ApiConfig,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub json: serde_json::Value,
}

pub fn test_config() -> ApiConfig {
    ApiConfig {
        jwt_secret: "test-secret".into(),
        ..ApiConfig::default()
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config(), Arc::new(MemoryCounterStore::new())).await
}

pub async fn spawn_app_with(config: ApiConfig, store: Arc<dyn CounterStore>) -> TestApp {
    let pool = tasker_core::db::connect_in_memory()
        .await
        .expect("in-memory database");
    let limiter = RateLimiter::new(store, config.rate_limit, config.rate_window);
    let state = AppState::new(pool.clone(), config.clone(), limiter).expect("app state");
    TestApp {
        app: tasker_api::router(state),
        pool,
        config,
    }
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> TestResponse {
        let resp = self.app.clone().oneshot(req).await.expect("request");
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("read body");
        let json = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).expect("parse JSON")
        };
        TestResponse {
            status,
            headers,
            json,
        }
    }

    pub async fn register(&self, username: &str, email: &str) -> TestResponse {
        self.send(json_request(
            Method::POST,
            "/v1/auth/register",
            None,
            serde_json::json!({
                "username": username,
                "email": email,
                "password": PASSWORD,
            }),
        ))
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> TestResponse {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/v1/auth/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!("username={username}&password={password}")))
            .unwrap();
        self.send(req).await
    }

    /// Register `username` and return a fresh access token.
    pub async fn token_for(&self, username: &str) -> String {
        let resp = self
            .register(username, &format!("{username}@example.com"))
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "register: {}", resp.json);
        let resp = self.login(username, PASSWORD).await;
        assert_eq!(resp.status, StatusCode::OK, "login: {}", resp.json);
        resp.json["access_token"]
            .as_str()
            .expect("access_token")
            .to_string()
    }
}

pub fn request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Attach a peer address, as `into_make_service_with_connect_info` would.
pub fn from_peer(mut req: Request<Body>, peer: &str) -> Request<Body> {
    let addr: SocketAddr = peer.parse().expect("socket address");
    req.extensions_mut().insert(ConnectInfo(addr));
    req
}
