//! Response cache used for conditional GET requests.
//!
//! - `filesystem` - one JSON file per key under a directory
//! - `memory` - in-process map

mod filesystem;
mod memory;

use reqwest::header::{ETAG, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use super::message::Response;
use crate::error::Result;

pub use filesystem::FilesystemCache;
pub use memory::MemoryCache;

/// Storage for previously fetched responses and their freshness metadata.
///
/// Entries are never evicted; `set` overwrites.
#[cfg_attr(test, mockall::automock)]
pub trait ResponseCache: Send + Sync {
    fn has(&self, key: &str) -> bool;

    /// Unix timestamp (seconds) of the last `set`, `None` for unknown keys.
    fn modified_since(&self, key: &str) -> Option<i64>;

    fn etag(&self, key: &str) -> Option<String>;

    /// Stored response, or [`ApiError::NotFound`](crate::error::ApiError::NotFound).
    fn get(&self, key: &str) -> Result<Response>;

    fn set(&self, key: &str, response: &Response) -> Result<()>;
}

/// What a cache keeps per key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedEntry {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub etag: Option<String>,
    pub modified_at: i64,
}

impl CachedEntry {
    /// Captures `response` with the current time as modification timestamp.
    pub fn capture(response: &Response) -> Self {
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                Some((name.as_str().to_string(), value.to_str().ok()?.to_string()))
            })
            .collect();

        Self {
            status: response.status(),
            headers,
            body: response.body().to_string(),
            etag: response.header(ETAG.as_str()).map(str::to_string),
            modified_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn to_response(&self) -> Response {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.append(name, value);
            }
        }
        Response::new(self.status, headers, self.body.clone())
    }
}
