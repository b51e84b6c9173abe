//! Domain models.
//!
//! These are internal domain models, distinct from the request/response
//! bodies defined in `tasker_api::models`.

pub mod auth;
pub mod task;
