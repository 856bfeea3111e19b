//! Async client for the 1001 Pharmacies seller REST API.
//!
//! - [`Client`] authenticates with the OAuth client-credentials grant and
//!   exposes the typed endpoints in [`api`]
//! - [`ResultPager`] follows the HATEOAS `_links` of paginated results
//! - [`http`] holds the transport, the middleware chain and the response cache

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod pager;

pub use api::{Api, BulkMode, Endpoint, IdType, ProductInventory, ProductUpdate};
pub use client::Client;
pub use config::{ApiVersion, ClientConfig, Credentials};
pub use error::{ApiError, Result};
pub use pager::ResultPager;
