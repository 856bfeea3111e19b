//! HTTP layer: transport, middleware chain and response cache.
//!
//! Requests go through the chain in order `auth`, `cache`, `error`:
//! - `auth` attaches a bearer token obtained with the client-credentials grant
//! - `cache` turns GETs into conditional requests and answers 304s
//! - `error` converts error responses into [`ApiError`](crate::error::ApiError)s

mod auth;
pub mod cache;
mod cached;
mod classify;
mod client;
mod message;
mod middleware;

pub use auth::{AuthMethod, AuthMiddleware};
pub use cached::{CacheMiddleware, cache_key};
pub use classify::{ErrorMiddleware, classify};
pub use client::HttpClient;
pub use message::{LinkRelation, PaginationLinks, RATE_LIMIT_REMAINING, Request, Response};
pub use middleware::Middleware;
