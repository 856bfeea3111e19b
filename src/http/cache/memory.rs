use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::{CachedEntry, ResponseCache};
use crate::error::{ApiError, Result};
use crate::http::message::Response;

/// Keeps entries for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CachedEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_entry<T>(&self, key: &str, f: impl FnOnce(&CachedEntry) -> T) -> Option<T> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).map(f)
    }
}

impl ResponseCache for MemoryCache {
    fn has(&self, key: &str) -> bool {
        self.with_entry(key, |_| ()).is_some()
    }

    fn modified_since(&self, key: &str) -> Option<i64> {
        self.with_entry(key, |e| e.modified_at)
    }

    fn etag(&self, key: &str) -> Option<String> {
        self.with_entry(key, |e| e.etag.clone()).flatten()
    }

    fn get(&self, key: &str) -> Result<Response> {
        self.with_entry(key, CachedEntry::to_response)
            .ok_or_else(|| ApiError::NotFound(key.to_string()))
    }

    fn set(&self, key: &str, response: &Response) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), CachedEntry::capture(response));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderMap;

    #[test]
    fn test_roundtrip_and_metadata() {
        let cache = MemoryCache::new();
        assert!(!cache.has("k"));
        assert_eq!(cache.modified_since("k"), None);

        cache
            .set("k", &Response::new(200, HeaderMap::new(), "body"))
            .unwrap();

        assert!(cache.has("k"));
        assert!(cache.modified_since("k").is_some());
        assert_eq!(cache.etag("k"), None);
        assert_eq!(cache.get("k").unwrap().body(), "body");
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let cache = MemoryCache::new();
        assert!(matches!(cache.get("missing"), Err(ApiError::NotFound(_))));
    }
}
