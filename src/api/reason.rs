use serde_json::Value;

use crate::client::Client;
use crate::error::Result;

/// After-sales (SAV) reasons.
#[derive(Clone, Copy)]
pub struct Reason<'a> {
    client: &'a Client,
}

impl<'a> Reason<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn all(&self) -> Result<Value> {
        super::get(self.client, "api/sav/reasons", &[]).await
    }
}
