use log::debug;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use super::{CachedEntry, ResponseCache};
use crate::error::{ApiError, Result};
use crate::http::message::Response;

/// Stores each entry as `{dir}/{hex(sha256(key))}.json`.
#[derive(Debug, Clone)]
pub struct FilesystemCache {
    dir: PathBuf,
}

impl FilesystemCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File names have a fixed length whatever the size of the key.
    fn path_for(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        let mut name = String::with_capacity(digest.len() * 2 + 5);
        for byte in digest {
            let _ = write!(name, "{:02x}", byte);
        }
        name.push_str(".json");
        self.dir.join(name)
    }

    fn read_entry(&self, key: &str) -> Result<Option<CachedEntry>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Lookups treat unreadable entries as absent.
    fn entry(&self, key: &str) -> Option<CachedEntry> {
        match self.read_entry(key) {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Ignoring unreadable cache entry for {}: {}", key, e);
                None
            }
        }
    }
}

impl ResponseCache for FilesystemCache {
    fn has(&self, key: &str) -> bool {
        self.path_for(key).exists()
    }

    fn modified_since(&self, key: &str) -> Option<i64> {
        self.entry(key).map(|e| e.modified_at)
    }

    fn etag(&self, key: &str) -> Option<String> {
        self.entry(key).and_then(|e| e.etag)
    }

    fn get(&self, key: &str) -> Result<Response> {
        self.read_entry(key)?
            .map(|e| e.to_response())
            .ok_or_else(|| ApiError::NotFound(key.to_string()))
    }

    fn set(&self, key: &str, response: &Response) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let entry = CachedEntry::capture(response);
        let path = self.path_for(key);
        fs::write(&path, serde_json::to_vec(&entry)?)?;
        debug!("Cached response for {} at {}", key, path.display());
        Ok(())
    }
}
