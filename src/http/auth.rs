//! OAuth2 client-credentials token provider.

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use serde_json::Value;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::message::Request;
use super::middleware::Middleware;
use crate::config::Credentials;
use crate::error::{ApiError, Result};

/// Path of the token endpoint, relative to the base URL.
pub const TOKEN_PATH: &str = "/oauth/v2/token";

/// Seconds shaved off `expires_in` so a token is not used right at its expiry.
const EXPIRY_SKEW_SECS: u64 = 30;

/// Supported OAuth2 grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    ClientCredentials,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::ClientCredentials => "client_credentials",
        }
    }
}

impl FromStr for AuthMethod {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "client_credentials" => Ok(AuthMethod::ClientCredentials),
            other => Err(ApiError::NotImplemented(other.to_string())),
        }
    }
}

struct AccessToken {
    value: String,
    expires_at: Option<Instant>,
}

impl AccessToken {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// Attaches `Authorization: Bearer {token}` to requests that carry none.
///
/// The token is kept until it expires or [`clear_token`](Self::clear_token)
/// is called. With no method configured the middleware does nothing.
pub struct AuthMiddleware {
    client: Client,
    base_url: String,
    credentials: Credentials,
    method: Option<AuthMethod>,
    token: Mutex<Option<AccessToken>>,
}

impl AuthMiddleware {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        credentials: Credentials,
        method: Option<AuthMethod>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            credentials,
            method,
            token: Mutex::new(None),
        }
    }

    /// Builds the middleware from a grant name, rejecting unsupported grants.
    pub fn from_method_name(
        client: Client,
        base_url: impl Into<String>,
        credentials: Credentials,
        method: Option<&str>,
    ) -> Result<Self> {
        let method = method.map(str::parse::<AuthMethod>).transpose()?;
        Ok(Self::new(client, base_url, credentials, method))
    }

    pub fn method(&self) -> Option<AuthMethod> {
        self.method
    }

    /// Forgets the cached token; the next request fetches a fresh one.
    pub async fn clear_token(&self) {
        *self.token.lock().await = None;
    }

    async fn bearer_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref().filter(|t| !t.is_expired()) {
            return Ok(token.value.clone());
        }

        let token = self.request_client_credential_token().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    #[tracing::instrument(skip(self))]
    async fn request_client_credential_token(&self) -> Result<AccessToken> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), TOKEN_PATH);
        debug!(
            "Requesting client_credentials token for client {} from {}...",
            self.credentials.client_id, url
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("grant_type", AuthMethod::ClientCredentials.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() {
            let message = if status.as_u16() == 400 {
                "Invalid credentials".to_string()
            } else {
                format!("token endpoint answered HTTP {}", status.as_u16())
            };
            return Err(ApiError::AuthenticationFailed(message));
        }
        if !status.is_success() {
            return Err(ApiError::Transport(format!(
                "Token endpoint answered HTTP {}",
                status.as_u16()
            )));
        }

        let data: Value = response.json().await?;
        let value = data
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ApiError::AuthenticationFailed("No access token returned on authenticate".into())
            })?
            .to_string();

        let expires_at = data.get("expires_in").and_then(Value::as_u64).map(|secs| {
            Instant::now() + Duration::from_secs(secs.saturating_sub(EXPIRY_SKEW_SECS))
        });

        debug!("Access token acquired (expires in {:?})", data.get("expires_in"));

        Ok(AccessToken { value, expires_at })
    }
}

#[async_trait]
impl Middleware for AuthMiddleware {
    fn name(&self) -> &'static str {
        "auth"
    }

    async fn before_send(&self, request: &mut Request) -> Result<()> {
        let Some(AuthMethod::ClientCredentials) = self.method else {
            return Ok(());
        };

        if request.headers.contains_key(AUTHORIZATION) {
            return Ok(());
        }

        let token = self.bearer_token().await?;
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))?;
        value.set_sensitive(true);
        request.headers.insert(AUTHORIZATION, value);
        Ok(())
    }
}
