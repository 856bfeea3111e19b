use serde_json::Value;

use crate::client::Client;
use crate::error::Result;

#[derive(Clone, Copy)]
pub struct Brand<'a> {
    client: &'a Client,
}

impl<'a> Brand<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn all(&self) -> Result<Value> {
        super::get(self.client, "api/brands", &[]).await
    }

    /// Products of one brand.
    pub async fn products(&self, brand_id: &str) -> Result<Value> {
        let path = format!("api/brands/{}/products/", brand_id);
        super::get(self.client, &path, &[]).await
    }
}
