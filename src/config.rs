//! Client configuration with named defaults.

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ApiError, Result};

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.florianajir.com";

/// Default `User-Agent` header value.
pub const DEFAULT_USER_AGENT: &str = "meup-client (https://github.com/florianajir/home-api)";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default number of requests allowed by the API rate limiter.
pub const DEFAULT_API_LIMIT: u32 = 5000;

/// API versions understood by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
pub enum ApiVersion {
    #[default]
    #[serde(rename = "latest")]
    Latest,
    #[serde(rename = "1.0")]
    V1,
}

impl ApiVersion {
    /// All supported versions, latest first.
    pub fn all() -> &'static [ApiVersion] {
        &[ApiVersion::Latest, ApiVersion::V1]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::Latest => "latest",
            ApiVersion::V1 => "1.0",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiVersion {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self> {
        ApiVersion::all()
            .iter()
            .copied()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| ApiError::InvalidArgument("You need to specify a valid Api version!".into()))
    }
}

/// Options for the HTTP layer.
///
/// Every field has a default; overrides are applied with the `with_*`
/// methods or by deserializing a partial document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub user_agent: String,
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Limit reported in rate-limit errors.
    pub api_limit: u32,
    pub api_version: ApiVersion,
    /// Directory for the response cache. No caching when unset.
    pub cache_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT_SECS,
            api_limit: DEFAULT_API_LIMIT,
            api_version: ApiVersion::default(),
            cache_dir: None,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    pub fn with_api_limit(mut self, limit: u32) -> Self {
        self.api_limit = limit;
        self
    }

    pub fn with_api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = version;
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Value of the `Accept` header sent with every request.
    pub fn accept_header(&self) -> String {
        format!("application/json;version={}", self.api_version)
    }
}

/// Client id / secret pair for the client-credentials grant.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Result<Self> {
        let client_id = client_id.into();
        let client_secret = client_secret.into();
        if client_id.is_empty() || client_secret.is_empty() {
            return Err(ApiError::InvalidArgument(
                "You need to specify yours credentials!".into(),
            ));
        }
        Ok(Self {
            client_id,
            client_secret,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}
