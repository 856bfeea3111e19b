//! Maps error responses to typed [`ApiError`]s.

use async_trait::async_trait;
use log::warn;
use serde_json::Value;

use super::message::{Request, Response};
use super::middleware::Middleware;
use crate::error::{ApiError, Result};

/// Classifies a 4xx/5xx response. Returns `None` for any other status.
///
/// `api_limit` is the value reported when the rate limit is exhausted.
pub fn classify(request: &Request, response: &Response, api_limit: u32) -> Option<ApiError> {
    if !response.is_client_error() && !response.is_server_error() {
        return None;
    }

    let exhausted = response
        .rate_limit_remaining()
        .is_some_and(|remaining| remaining < 1);
    if exhausted && !request.resource().starts_with("rate_limit") {
        return Some(ApiError::RateLimitExceeded { limit: api_limit });
    }

    let content = match response.json() {
        Ok(content) => content,
        Err(_) => return Some(ApiError::Transport(response.body().to_string())),
    };

    if let Some(message) = content.get("message").and_then(Value::as_str) {
        let message = message.to_string();
        match response.status() {
            400 => return Some(ApiError::BadRequest(message)),
            500 => return Some(ApiError::ServerError(message)),
            401 => {
                let description = content
                    .pointer("/errors/error_description")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or(message);
                return Some(ApiError::Unauthorized(description));
            }
            422 => {
                if let Some(errors) = content.get("errors").and_then(Value::as_array) {
                    return Some(validation_failed(errors));
                }
            }
            _ => {}
        }
    }

    Some(generic_error(&content, response.status()))
}

fn validation_failed(errors: &[Value]) -> ApiError {
    let sentences: Vec<String> = errors.iter().map(describe_field_error).collect();
    ApiError::ValidationFailed(format!("Validation Failed: {}", sentences.join(", ")))
}

fn describe_field_error(error: &Value) -> String {
    let field = text(error, "field");
    let resource = text(error, "resource");

    match error.get("code").and_then(Value::as_str) {
        Some("missing") => format!(
            "The {} {} does not exist, for resource \"{}\"",
            field,
            text(error, "value"),
            resource
        ),
        Some("missing_field") => {
            format!("Field \"{}\" is missing, for resource \"{}\"", field, resource)
        }
        Some("invalid") => {
            format!("Field \"{}\" is invalid, for resource \"{}\"", field, resource)
        }
        Some("already_exists") => format!(
            "Field \"{}\" already exists, for resource \"{}\"",
            field, resource
        ),
        _ => text(error, "message"),
    }
}

fn generic_error(content: &Value, status: u16) -> ApiError {
    let mut code = None;

    let message = match content.get("error") {
        Some(Value::Object(_)) if content.get("error_description").is_some() => {
            text(content, "error_description")
        }
        // OAuth error format
        Some(error @ Value::Object(_)) => {
            code = error.get("code").map(scalar_text);
            text(error, "message")
        }
        Some(error) => scalar_text(error),
        None => match content.get("message") {
            Some(message) => scalar_text(message),
            None => scalar_text(content),
        },
    };

    ApiError::GenericApiError {
        message,
        status,
        code,
    }
}

fn text(value: &Value, key: &str) -> String {
    value.get(key).map(scalar_text).unwrap_or_default()
}

/// Strings without quotes, everything else serialized.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Turns error responses into errors. Runs last in the chain.
pub struct ErrorMiddleware {
    api_limit: u32,
}

impl ErrorMiddleware {
    pub fn new(api_limit: u32) -> Self {
        Self { api_limit }
    }
}

#[async_trait]
impl Middleware for ErrorMiddleware {
    fn name(&self) -> &'static str {
        "error"
    }

    async fn on_response(&self, request: &Request, response: Response) -> Result<Response> {
        match classify(request, &response, self.api_limit) {
            Some(error) => {
                warn!(
                    "{} {} failed with HTTP {}: {}",
                    request.method,
                    request.path,
                    response.status(),
                    error
                );
                Err(error)
            }
            None => Ok(response),
        }
    }
}
