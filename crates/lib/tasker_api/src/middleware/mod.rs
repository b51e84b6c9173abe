//! Request guards.
//!
//! A guard either passes the request on or short-circuits with an
//! [`AppError`](crate::error::AppError). Routes declare their guards as an
//! ordered list; [`guarded`] layers them so the list order is the execution
//! order.

pub mod auth;
pub mod rate_limit;

use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};

use crate::AppState;

/// A single step in a route's guard chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Count the request against the client's window.
    RateLimit,
    /// Require a valid bearer token for an existing user.
    Auth,
    /// Require the authenticated user to be an admin. Must follow `Auth`.
    Admin,
}

/// Wrap every route of `router` with `guards`, first entry outermost.
///
/// Guards only run for matched routes; unknown paths still fall through to
/// a plain 404.
pub fn guarded(router: Router<AppState>, state: &AppState, guards: &[Guard]) -> Router<AppState> {
    guards.iter().rev().fold(router, |router, guard| match guard {
        Guard::RateLimit => router.route_layer(from_fn_with_state(
            state.clone(),
            rate_limit::enforce_rate_limit,
        )),
        Guard::Auth => {
            router.route_layer(from_fn_with_state(state.clone(), auth::require_auth))
        }
        Guard::Admin => router.route_layer(from_fn(auth::require_admin)),
    })
}
