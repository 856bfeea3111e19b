//! HTTP client running requests through the middleware chain.

use log::debug;
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Client, Method};
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};

use super::message::{Request, Response};
use super::middleware::Middleware;
use crate::config::ClientConfig;
use crate::error::Result;

/// Sends requests relative to the configured base URL.
///
/// Default headers (`Accept`, `User-Agent`) are merged under per-request
/// headers. The last request and response are kept so that the pager can
/// read pagination links after an endpoint call.
pub struct HttpClient {
    client: Client,
    base_url: String,
    default_headers: HeaderMap,
    headers: HeaderMap,
    middleware: Vec<Arc<dyn Middleware>>,
    last_request: RwLock<Option<Request>>,
    last_response: RwLock<Option<Response>>,
}

impl HttpClient {
    /// Builds the transport from `config` and composes `middleware` in order.
    pub fn new(config: &ClientConfig, middleware: Vec<Arc<dyn Middleware>>) -> Result<Self> {
        Self::with_transport(Self::transport(config)?, config, middleware)
    }

    /// Uses an existing reqwest client as transport.
    pub fn with_transport(
        client: Client,
        config: &ClientConfig,
        middleware: Vec<Arc<dyn Middleware>>,
    ) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_str(&config.accept_header())?);
        default_headers.insert(USER_AGENT, HeaderValue::from_str(&config.user_agent)?);

        debug!(
            "HTTP client for {} with middleware [{}]",
            config.base_url,
            middleware
                .iter()
                .map(|m| m.name())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            headers: default_headers.clone(),
            default_headers,
            middleware,
            last_request: RwLock::new(None),
            last_response: RwLock::new(None),
        })
    }

    /// reqwest client honoring the configured timeout.
    pub fn transport(config: &ClientConfig) -> Result<Client> {
        Ok(Client::builder()
            .timeout(config.timeout_duration())
            .build()?)
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn middleware(&self) -> &[Arc<dyn Middleware>] {
        &self.middleware
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn set_header(&mut self, name: &str, value: &str) -> Result<()> {
        self.headers.insert(
            HeaderName::from_bytes(name.as_bytes())?,
            HeaderValue::from_str(value)?,
        );
        Ok(())
    }

    pub fn set_headers(&mut self, headers: &[(&str, &str)]) -> Result<()> {
        for (name, value) in headers {
            self.set_header(name, value)?;
        }
        Ok(())
    }

    /// Inserts every header of `headers`, replacing existing values.
    pub fn merge_headers(&mut self, headers: HeaderMap) {
        for (name, value) in headers.iter() {
            self.headers.insert(name.clone(), value.clone());
        }
    }

    /// Drops custom headers, keeping `Accept` and `User-Agent`.
    pub fn clear_headers(&mut self) {
        self.headers = self.default_headers.clone();
    }

    /// Absolute URIs are used as is. Paths starting with `/` resolve against
    /// the origin of the base URL, other paths are appended to it.
    pub fn url_for(&self, path: &str) -> String {
        if reqwest::Url::parse(path).is_ok() {
            return path.to_string();
        }
        if path.starts_with('/') {
            if let Ok(url) = reqwest::Url::parse(&self.base_url).and_then(|base| base.join(path)) {
                return url.to_string();
            }
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub async fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<Response> {
        let mut request = Request::get(path);
        for (key, value) in query {
            request.set_query(*key, *value);
        }
        self.request(with_headers(request, headers)?).await
    }

    pub async fn post(
        &self,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> Result<Response> {
        self.send_body(Method::POST, path, body, headers).await
    }

    pub async fn patch(
        &self,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> Result<Response> {
        self.send_body(Method::PATCH, path, body, headers).await
    }

    pub async fn put(
        &self,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> Result<Response> {
        self.send_body(Method::PUT, path, body, headers).await
    }

    pub async fn delete(
        &self,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> Result<Response> {
        self.send_body(Method::DELETE, path, body, headers).await
    }

    async fn send_body(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> Result<Response> {
        let mut request = Request::new(method, path);
        request.body = body;
        self.request(with_headers(request, headers)?).await
    }

    /// Runs `request` through the chain and the transport.
    #[tracing::instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn request(&self, mut request: Request) -> Result<Response> {
        for (name, value) in &self.headers {
            if !request.headers.contains_key(name) {
                request.headers.insert(name.clone(), value.clone());
            }
        }

        for mw in &self.middleware {
            mw.before_send(&mut request).await?;
        }
        *self
            .last_request
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(request.clone());

        let url = self.url_for(&request.path);
        debug!("{} {}", request.method, url);

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .headers(request.headers.clone());
        if !request.query().is_empty() {
            builder = builder.query(request.query());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let raw = builder.send().await?;
        let mut response = Response::from_reqwest(raw).await?;
        debug!("{} {} -> {}", request.method, url, response.status());

        for mw in &self.middleware {
            response = mw.on_response(&request, response).await?;
        }

        *self
            .last_response
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(response.clone());
        Ok(response)
    }

    pub fn last_request(&self) -> Option<Request> {
        self.last_request
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Last response that made it through the whole chain.
    pub fn last_response(&self) -> Option<Response> {
        self.last_response
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn with_headers(mut request: Request, headers: &[(&str, &str)]) -> Result<Request> {
    for (name, value) in headers {
        request = request.with_header(name, value)?;
    }
    Ok(request)
}
