//! REST execution helper
//!
//! Builds request URLs from a host and a relative path, executes through
//! the transport chain, classifies non-2xx responses into a structured
//! [`HttpError`], and optionally follows the pagination cursor embedded
//! in list responses.

use std::env;

use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::api::transport::{
    CredentialInjector, DefaultHeaders, Interceptor, PendingRequest, RequestLogger, Transport,
};
use crate::core::config::{AuthConfig, DEBUG_ENV};
use crate::core::hosts::Instance;
use crate::error::{BbError, HttpError, Result};

/// API client bound to one authentication configuration.
///
/// Calls are blocking request/response; independent requests may be
/// issued from concurrent tasks, and dropping an in-flight future simply
/// aborts the underlying network call.
pub struct Client {
    transport: Transport,
    instance: Instance,
}

impl Client {
    /// Build a client with the standard interceptor chain.
    ///
    /// Request logging is enabled by `verbose` or a non-empty `BB_DEBUG`;
    /// the per-header dump follows the explicit flag only.
    pub fn new(auth: AuthConfig, verbose: bool) -> Result<Self> {
        let instance = auth.instance().clone();
        let logging = verbose || env::var(DEBUG_ENV).is_ok_and(|v| !v.is_empty());

        let mut chain: Vec<Box<dyn Interceptor>> = Vec::new();
        chain.push(Box::new(CredentialInjector::new(auth)));
        if logging {
            chain.push(Box::new(RequestLogger { verbose }));
        }
        chain.push(Box::new(DefaultHeaders::new()));

        Ok(Self {
            transport: Transport::new(chain)?,
            instance,
        })
    }

    fn url_for(&self, host: &str, path: &str) -> Result<Url> {
        let raw = format!(
            "{}{}",
            self.instance.rest_base_url(host),
            path.trim_start_matches('/')
        );
        Url::parse(&raw).map_err(|_| BbError::InvalidInput(format!("invalid request URL: {raw}")))
    }

    /// Execute a REST call against a host-relative path.
    ///
    /// Returns `Ok(None)` for 204 or an empty body; any other 2xx body is
    /// decoded into `T`, and a decode failure surfaces as-is.
    pub async fn rest<T: DeserializeOwned>(
        &self,
        host: &str,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Option<T>> {
        let url = self.url_for(host, path)?;
        self.rest_url(url, method, body).await
    }

    /// Full-URL-targeting variant of [`Client::rest`].
    pub async fn rest_url<T: DeserializeOwned>(
        &self,
        url: Url,
        method: Method,
        body: Option<Value>,
    ) -> Result<Option<T>> {
        match self.execute(url, method, body).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Like [`Client::rest`], additionally extracting the `next`
    /// pagination URL from the same response body.
    ///
    /// Pagination metadata is best-effort: a missing or malformed `next`
    /// field yields `None` and never fails an otherwise-successful call.
    pub async fn rest_with_next<T: DeserializeOwned>(
        &self,
        host: &str,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<(Option<T>, Option<String>)> {
        let url = self.url_for(host, path)?;
        self.rest_url_with_next(url, method, body).await
    }

    /// Full-URL-targeting variant of [`Client::rest_with_next`].
    pub async fn rest_url_with_next<T: DeserializeOwned>(
        &self,
        url: Url,
        method: Method,
        body: Option<Value>,
    ) -> Result<(Option<T>, Option<String>)> {
        match self.execute(url, method, body).await? {
            Some(value) => {
                let next = next_cursor(&value);
                Ok((Some(serde_json::from_value(value)?), next))
            }
            None => Ok((None, None)),
        }
    }

    /// GET expecting a response body.
    pub async fn get<T: DeserializeOwned>(&self, host: &str, path: &str) -> Result<T> {
        let url = self.url_for(host, path)?;
        match self.rest_url(url.clone(), Method::GET, None).await? {
            Some(value) => Ok(value),
            None => Err(BbError::EmptyResponse(url.to_string())),
        }
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        host: &str,
        path: &str,
        body: Value,
    ) -> Result<Option<T>> {
        self.rest(host, Method::POST, path, Some(body)).await
    }

    pub async fn put<T: DeserializeOwned>(
        &self,
        host: &str,
        path: &str,
        body: Value,
    ) -> Result<Option<T>> {
        self.rest(host, Method::PUT, path, Some(body)).await
    }

    pub async fn patch<T: DeserializeOwned>(
        &self,
        host: &str,
        path: &str,
        body: Value,
    ) -> Result<Option<T>> {
        self.rest(host, Method::PATCH, path, Some(body)).await
    }

    pub async fn delete(&self, host: &str, path: &str) -> Result<()> {
        self.rest::<Value>(host, Method::DELETE, path, None).await?;
        Ok(())
    }

    async fn execute(&self, url: Url, method: Method, body: Option<Value>) -> Result<Option<Value>> {
        let mut req = PendingRequest::new(method, url.clone());
        req.headers
            .insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(body) = &body {
            req.headers
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            req.body = Some(serde_json::to_vec(body)?);
        }

        let response = self.transport.send(req).await?;
        let status = response.status();

        if status.is_success() {
            let text = if status == StatusCode::NO_CONTENT {
                String::new()
            } else {
                response.text().await?
            };
            return decode_success(status, &text);
        }

        let body = response.text().await.unwrap_or_default();
        Err(HttpError {
            status: status.as_u16(),
            message: error_message(status, &body),
            url: url.to_string(),
            body,
        }
        .into())
    }
}

/// Decode a successful response body. 204 and empty bodies short-circuit
/// to `None` without touching the decoder.
fn decode_success(status: StatusCode, text: &str) -> Result<Option<Value>> {
    if status == StatusCode::NO_CONTENT || text.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(text)?))
}

/// Best-effort extraction of the pagination cursor from a list response.
fn next_cursor(value: &Value) -> Option<String> {
    value
        .get("next")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Error envelope convention: `{"error": {"message": ..., "detail": ...}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    detail: Option<String>,
}

/// Extract a human-readable message from a non-2xx response body.
///
/// Prefers the structured envelope, then the trimmed raw body, then the
/// canonical status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        if let Some(error) = envelope.error {
            if !error.message.is_empty() {
                return match error.detail.filter(|d| !d.is_empty()) {
                    Some(detail) => format!("{}: {}", error.message, detail),
                    None => error.message,
                };
            }
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    status.canonical_reason().unwrap_or("unknown status").to_string()
}
