//! Request/response interceptors run by [`HttpClient`](super::HttpClient).

use async_trait::async_trait;

use super::message::{Request, Response};
use crate::error::Result;

/// One link of the interceptor chain.
///
/// `before_send` hooks run in chain order before the transport is called and
/// may rewrite the request. `on_response` hooks run in the same order once a
/// response arrives and may replace it. Returning an error from either hook
/// stops the chain and surfaces the error to the caller.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Name used in log lines.
    fn name(&self) -> &'static str;

    async fn before_send(&self, _request: &mut Request) -> Result<()> {
        Ok(())
    }

    async fn on_response(&self, _request: &Request, response: Response) -> Result<Response> {
        Ok(response)
    }
}
