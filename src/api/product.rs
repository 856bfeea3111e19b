use reqwest::Method;
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;

use crate::client::Client;
use crate::error::Result;

/// How a product is identified in product paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdType {
    Sku,
    Ean,
    Reference,
}

impl IdType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdType::Sku => "sku",
            IdType::Ean => "ean",
            IdType::Reference => "reference",
        }
    }
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Merge strategy of [`Product::bulk_update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BulkMode {
    #[default]
    Merge,
    Replace,
}

/// Fields to change on a product. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warn_quantity: Option<i64>,
    /// Decimal price such as `"12.90"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl ProductUpdate {
    pub fn quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn warn_quantity(mut self, warn_quantity: i64) -> Self {
        self.warn_quantity = Some(warn_quantity);
        self
    }

    pub fn price(mut self, price: impl Into<String>) -> Self {
        self.price = Some(price.into());
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }
}

/// One line of a bulk inventory update.
///
/// At least one identifier must be set. An EAN or a reference may match
/// several products; each of them is updated.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductInventory {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ean: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(flatten)]
    pub update: ProductUpdate,
}

impl ProductInventory {
    pub fn new(id_type: IdType, identifier: impl Into<String>, update: ProductUpdate) -> Self {
        let identifier = Some(identifier.into());
        let mut inventory = Self {
            update,
            ..Self::default()
        };
        match id_type {
            IdType::Sku => inventory.sku = identifier,
            IdType::Ean => inventory.ean = identifier,
            IdType::Reference => inventory.reference = identifier,
        }
        inventory
    }
}

/// Product catalog and stock.
#[derive(Clone, Copy)]
pub struct Product<'a> {
    client: &'a Client,
}

impl<'a> Product<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn find(&self, id_type: IdType, identifier: &str) -> Result<Value> {
        super::get(self.client, &product_path(id_type, identifier, None), &[]).await
    }

    pub async fn find_by_sku(&self, sku: &str) -> Result<Value> {
        self.find(IdType::Sku, sku).await
    }

    pub async fn find_by_ean(&self, ean: &str) -> Result<Value> {
        self.find(IdType::Ean, ean).await
    }

    pub async fn find_by_reference(&self, reference: &str) -> Result<Value> {
        self.find(IdType::Reference, reference).await
    }

    /// Removes `quantity` units from the stock.
    pub async fn destock(&self, id_type: IdType, identifier: &str, quantity: i64) -> Result<Value> {
        let path = product_path(id_type, identifier, Some("destock"));
        super::send(self.client, Method::POST, &path, json!({ "quantity": quantity })).await
    }

    /// Sets the stock.
    pub async fn update_quantity(
        &self,
        id_type: IdType,
        identifier: &str,
        quantity: i64,
    ) -> Result<Value> {
        let path = product_path(id_type, identifier, Some("quantity"));
        super::send(self.client, Method::PATCH, &path, json!({ "quantity": quantity })).await
    }

    /// Sets the stock level below which alerts are raised.
    pub async fn update_warning_quantity(
        &self,
        id_type: IdType,
        identifier: &str,
        warn_quantity: i64,
    ) -> Result<Value> {
        let path = product_path(id_type, identifier, Some("warnquantity"));
        let body = json!({ "warn_quantity": warn_quantity });
        super::send(self.client, Method::PATCH, &path, body).await
    }

    pub async fn update(
        &self,
        id_type: IdType,
        identifier: &str,
        update: ProductUpdate,
    ) -> Result<Value> {
        let inventory = ProductInventory::new(id_type, identifier, update);
        self.bulk_update(&[inventory], BulkMode::Merge).await
    }

    pub async fn bulk_update(&self, products: &[ProductInventory], mode: BulkMode) -> Result<Value> {
        let path = match mode {
            BulkMode::Merge => "api/products/update",
            BulkMode::Replace => "api/products/update?type=replace",
        };
        let body = serde_json::to_value(products)?;
        super::send(self.client, Method::PUT, path, body).await
    }
}

fn product_path(id_type: IdType, identifier: &str, action: Option<&str>) -> String {
    match action {
        Some(action) => format!("api/product/{}/{}/{}", id_type, identifier, action),
        None => format!("api/product/{}/{}", id_type, identifier),
    }
}
