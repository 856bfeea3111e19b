//! Conditional GET support on top of a [`ResponseCache`].

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Method;
use reqwest::header::{HeaderValue, IF_MODIFIED_SINCE, IF_NONE_MATCH};
use std::sync::Arc;

use super::cache::ResponseCache;
use super::message::{Request, Response};
use super::middleware::Middleware;
use crate::error::Result;

/// Sends `If-Modified-Since` / `If-None-Match` for cached GETs, answers 304s
/// from the cache and stores fresh 2xx responses.
///
/// A response that cannot be stored is still returned.
pub struct CacheMiddleware {
    cache: Arc<dyn ResponseCache>,
    namespace: Option<String>,
}

impl CacheMiddleware {
    pub fn new(cache: Arc<dyn ResponseCache>) -> Self {
        Self {
            cache,
            namespace: None,
        }
    }

    /// Prefixes every key with `namespace:`, so accounts sharing one cache
    /// never answer each other's 304s.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn cache(&self) -> &Arc<dyn ResponseCache> {
        &self.cache
    }

    fn key_for(&self, request: &Request) -> String {
        let key = cache_key(request);
        match &self.namespace {
            Some(namespace) => format!("{}:{}", namespace, key),
            None => key,
        }
    }
}

/// Cache key for a request: its path plus any query parameters.
pub fn cache_key(request: &Request) -> String {
    if request.query().is_empty() {
        return request.path.clone();
    }
    let query: Vec<String> = request
        .query()
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect();
    let separator = if request.path.contains('?') { '&' } else { '?' };
    format!("{}{}{}", request.path, separator, query.join("&"))
}

/// Formats a unix timestamp as an HTTP date.
fn http_date(timestamp: i64) -> Option<String> {
    let date = chrono::DateTime::from_timestamp(timestamp, 0)?;
    Some(date.format("%a, %d %b %Y %H:%M:%S GMT").to_string())
}

#[async_trait]
impl Middleware for CacheMiddleware {
    fn name(&self) -> &'static str {
        "cache"
    }

    async fn before_send(&self, request: &mut Request) -> Result<()> {
        if request.method != Method::GET {
            return Ok(());
        }
        let key = self.key_for(request);

        if let Some(date) = self.cache.modified_since(&key).and_then(http_date) {
            request
                .headers
                .entry(IF_MODIFIED_SINCE)
                .or_insert(HeaderValue::from_str(&date)?);
        }
        if let Some(etag) = self.cache.etag(&key) {
            request
                .headers
                .entry(IF_NONE_MATCH)
                .or_insert(HeaderValue::from_str(&etag)?);
        }
        Ok(())
    }

    async fn on_response(&self, request: &Request, response: Response) -> Result<Response> {
        if request.method != Method::GET {
            return Ok(response);
        }
        let key = self.key_for(request);

        if response.is_not_modified() {
            debug!("{} not modified, serving cached response", key);
            return self.cache.get(&key);
        }
        if response.is_success() {
            if let Err(e) = self.cache.set(&key, &response) {
                warn!("Could not cache response for {}: {}", key, e);
            }
        }
        Ok(response)
    }
}
