use reqwest::Method;
use serde_json::{Value, json};

use crate::client::Client;
use crate::error::Result;

/// Orders awaiting preparation.
#[derive(Clone, Copy)]
pub struct Order<'a> {
    client: &'a Client,
}

impl<'a> Order<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Order by identifier (complete invoice number).
    pub async fn find(&self, identifier: &str) -> Result<Value> {
        let path = format!("api/orders/{}", urlencoding::encode(identifier));
        super::get(self.client, &path, &[]).await
    }

    /// Orders list without details. `params` become query parameters.
    pub async fn all(&self, params: &[(&str, &str)]) -> Result<Value> {
        super::get(self.client, "api/orders", params).await
    }

    pub async fn parcel_label(&self, identifier: &str) -> Result<Value> {
        let path = format!("api/orders/{}/parcellabel", identifier);
        super::get(self.client, &path, &[]).await
    }

    pub async fn expediate(&self, identifier: &str) -> Result<Value> {
        let path = format!("api/orders/{}/expediate", identifier);
        super::send(self.client, Method::POST, &path, json!({})).await
    }
}
