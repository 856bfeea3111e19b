//! Request and response values exchanged with the transport.

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::Result;

/// Header carrying the number of calls left in the current rate-limit window.
pub const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";

/// An outgoing request.
///
/// Middleware may adjust it in `before_send`; after that it is only read.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// Path relative to the base URL, or an absolute URI.
    pub path: String,
    query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Adds a query parameter. An existing key keeps its position and gets the new value.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_query(key, value);
        self
    }

    pub fn set_query(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.query.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.query.push((key, value)),
        }
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        self.headers.insert(
            HeaderName::from_bytes(name.as_bytes())?,
            HeaderValue::from_str(value)?,
        );
        Ok(self)
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Path without query string and without the leading slash.
    pub fn resource(&self) -> &str {
        let path = self.path.split('?').next().unwrap_or_default();
        path.trim_start_matches('/')
    }
}

/// A completed response with its body fully read.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: u16,
    headers: HeaderMap,
    body: String,
}

impl Response {
    pub fn new(status: u16, headers: HeaderMap, body: impl Into<String>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Reads status, headers and body from a transport response.
    pub async fn from_reqwest(response: reqwest::Response) -> Result<Self> {
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await?;
        Ok(Self::new(status, headers, body))
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_modified(&self) -> bool {
        self.status == 304
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// Strict JSON parse of the body.
    pub fn json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.body)
    }

    /// Body as JSON, or the raw body as a JSON string when it does not parse.
    pub fn content(&self) -> Value {
        self.json()
            .unwrap_or_else(|_| Value::String(self.body.clone()))
    }

    pub fn pagination(&self) -> Option<PaginationLinks> {
        PaginationLinks::from_content(&self.json().ok()?)
    }

    /// `limit` field of a paginated body.
    pub fn per_page(&self) -> Option<u64> {
        self.json().ok()?.get("limit")?.as_u64()
    }

    /// `page` field of a paginated body.
    pub fn current_page(&self) -> Option<u64> {
        self.json().ok()?.get("page")?.as_u64()
    }

    /// `pages` field of a paginated body.
    pub fn max_pages(&self) -> Option<u64> {
        self.json().ok()?.get("pages")?.as_u64()
    }

    /// `X-RateLimit-Remaining`, when present and numeric.
    pub fn rate_limit_remaining(&self) -> Option<i64> {
        self.header(RATE_LIMIT_REMAINING)?.trim().parse().ok()
    }
}

/// Link relations the pager understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LinkRelation {
    Current,
    First,
    Last,
    Next,
    Previous,
}

impl LinkRelation {
    const ALL: [LinkRelation; 5] = [
        LinkRelation::Current,
        LinkRelation::First,
        LinkRelation::Last,
        LinkRelation::Next,
        LinkRelation::Previous,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LinkRelation::Current => "self",
            LinkRelation::First => "first",
            LinkRelation::Last => "last",
            LinkRelation::Next => "next",
            LinkRelation::Previous => "previous",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|rel| rel.as_str() == name)
    }
}

impl fmt::Display for LinkRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hypermedia links of one paginated response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationLinks {
    links: BTreeMap<LinkRelation, String>,
}

impl PaginationLinks {
    /// Reads `_links` from a parsed body. `None` when the body is empty or has no `_links`.
    pub fn from_content(content: &Value) -> Option<Self> {
        let links = content.as_object()?.get("_links")?.as_object()?;

        let links = links
            .iter()
            .filter_map(|(name, link)| {
                let rel = LinkRelation::from_name(name)?;
                let href = link.get("href")?.as_str()?;
                Some((rel, href.to_string()))
            })
            .collect();

        Some(Self { links })
    }

    pub fn get(&self, rel: LinkRelation) -> Option<&str> {
        self.links.get(&rel).map(String::as_str)
    }

    pub fn contains(&self, rel: LinkRelation) -> bool {
        self.links.contains_key(&rel)
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LinkRelation, &str)> {
        self.links.iter().map(|(rel, href)| (*rel, href.as_str()))
    }
}
