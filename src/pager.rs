//! Walks paginated collections through their `_links`.

use log::debug;
use serde_json::Value;
use std::future::Future;

use crate::client::Client;
use crate::error::{ApiError, Result};
use crate::http::{LinkRelation, PaginationLinks};

/// Follows hypermedia links of paginated endpoint results.
///
/// ```no_run
/// # async fn run(client: &meup_client::Client) -> meup_client::Result<()> {
/// use meup_client::ResultPager;
///
/// let mut pager = ResultPager::new(client);
/// let orders = pager.fetch_all(client.orders().all(&[])).await?;
/// println!("{} orders", orders.len());
/// # Ok(())
/// # }
/// ```
pub struct ResultPager<'a> {
    client: &'a Client,
    pagination: Option<PaginationLinks>,
}

impl<'a> ResultPager<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self {
            client,
            pagination: None,
        }
    }

    /// Awaits an endpoint call and records the pagination of its response.
    pub async fn fetch<F>(&mut self, call: F) -> Result<Value>
    where
        F: Future<Output = Result<Value>>,
    {
        let result = call.await?;
        self.post_fetch();
        Ok(result)
    }

    /// Awaits an endpoint call, then follows `next` links until the last page.
    ///
    /// Returns the `_embedded.items` of every page in traversal order.
    pub async fn fetch_all<F>(&mut self, call: F) -> Result<Vec<Value>>
    where
        F: Future<Output = Result<Value>>,
    {
        let first = self.fetch(call).await?;
        let mut items = embedded_items(first)?;

        while let Some(next) = self.link(LinkRelation::Next) {
            debug!("Following next page {}", next);
            let page = self.get(&next).await?;
            items.extend(embedded_items(page)?);
        }

        debug!("Fetched {} items", items.len());
        Ok(items)
    }

    pub fn has_next(&self) -> bool {
        self.has(LinkRelation::Next)
    }

    pub fn has_previous(&self) -> bool {
        self.has(LinkRelation::Previous)
    }

    pub async fn fetch_next(&mut self) -> Result<Option<Value>> {
        self.fetch_relation(LinkRelation::Next).await
    }

    pub async fn fetch_previous(&mut self) -> Result<Option<Value>> {
        self.fetch_relation(LinkRelation::Previous).await
    }

    pub async fn fetch_first(&mut self) -> Result<Option<Value>> {
        self.fetch_relation(LinkRelation::First).await
    }

    pub async fn fetch_last(&mut self) -> Result<Option<Value>> {
        self.fetch_relation(LinkRelation::Last).await
    }

    /// Links of the last fetched page.
    pub fn pagination(&self) -> Option<&PaginationLinks> {
        self.pagination.as_ref()
    }

    fn has(&self, rel: LinkRelation) -> bool {
        self.pagination.as_ref().is_some_and(|p| p.contains(rel))
    }

    fn link(&self, rel: LinkRelation) -> Option<String> {
        self.pagination.as_ref()?.get(rel).map(str::to_string)
    }

    async fn fetch_relation(&mut self, rel: LinkRelation) -> Result<Option<Value>> {
        match self.link(rel) {
            Some(uri) => Ok(Some(self.get(&uri).await?)),
            None => Ok(None),
        }
    }

    async fn get(&mut self, uri: &str) -> Result<Value> {
        let response = self.client.http_client().get(uri, &[], &[]).await?;
        self.post_fetch();
        Ok(response.content())
    }

    fn post_fetch(&mut self) {
        self.pagination = self
            .client
            .http_client()
            .last_response()
            .and_then(|response| response.pagination());
    }
}

fn embedded_items(page: Value) -> Result<Vec<Value>> {
    match page {
        Value::Object(mut map) => match map.remove("_embedded") {
            Some(Value::Object(mut embedded)) => match embedded.remove("items") {
                Some(Value::Array(items)) => Ok(items),
                _ => Err(ApiError::MissingEmbeddedItems),
            },
            _ => Err(ApiError::MissingEmbeddedItems),
        },
        _ => Err(ApiError::MissingEmbeddedItems),
    }
}
