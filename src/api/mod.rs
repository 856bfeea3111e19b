//! Typed endpoints of the REST API.
//!
//! Each endpoint borrows the [`Client`] and returns the parsed JSON content
//! of the response.

mod brand;
mod order;
mod product;
mod reason;

use reqwest::Method;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::client::Client;
use crate::error::{ApiError, Result};
use crate::http::Request;

pub use brand::Brand;
pub use order::Order;
pub use product::{BulkMode, IdType, Product, ProductInventory, ProductUpdate};
pub use reason::Reason;

/// API groups reachable through [`Client::api`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Api {
    Order,
    Product,
    Reason,
    Brand,
}

impl Api {
    pub fn all() -> &'static [Api] {
        &[Api::Order, Api::Product, Api::Reason, Api::Brand]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Api::Order => "order",
            Api::Product => "product",
            Api::Reason => "reason",
            Api::Brand => "brand",
        }
    }
}

impl fmt::Display for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Api {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self> {
        Api::all()
            .iter()
            .copied()
            .find(|api| api.as_str() == s)
            .ok_or_else(|| {
                ApiError::InvalidArgument(format!("Undefined api instance called: \"{}\"", s))
            })
    }
}

/// An endpoint selected at runtime by [`Api`].
#[derive(Clone, Copy)]
pub enum Endpoint<'a> {
    Order(Order<'a>),
    Product(Product<'a>),
    Reason(Reason<'a>),
    Brand(Brand<'a>),
}

impl<'a> Endpoint<'a> {
    pub fn new(client: &'a Client, api: Api) -> Self {
        match api {
            Api::Order => Endpoint::Order(Order::new(client)),
            Api::Product => Endpoint::Product(Product::new(client)),
            Api::Reason => Endpoint::Reason(Reason::new(client)),
            Api::Brand => Endpoint::Brand(Brand::new(client)),
        }
    }

    pub fn kind(&self) -> Api {
        match self {
            Endpoint::Order(_) => Api::Order,
            Endpoint::Product(_) => Api::Product,
            Endpoint::Reason(_) => Api::Reason,
            Endpoint::Brand(_) => Api::Brand,
        }
    }
}

async fn get(client: &Client, path: &str, query: &[(&str, &str)]) -> Result<Value> {
    let response = client.http_client().get(path, query, &[]).await?;
    Ok(response.content())
}

async fn send(client: &Client, method: Method, path: &str, body: Value) -> Result<Value> {
    let request = Request::new(method, path).with_json(body);
    let response = client.http_client().request(request).await?;
    Ok(response.content())
}
