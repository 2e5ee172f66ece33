//! HTTP transport with an interceptor chain
//!
//! Requests pass through an ordered chain of interceptors before they hit
//! the network: credential injection first, then logging, then default
//! headers (the response phase runs the same chain in reverse). Redirects
//! are followed here rather than inside reqwest so the credential
//! injector can compare the hosts of consecutive hops: a credential must
//! never follow a cross-host redirect.

use std::time::Duration;

use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, LOCATION, USER_AGENT,
};
use reqwest::redirect::Policy;
use reqwest::{Method, StatusCode, Url};

use crate::core::config::AuthConfig;
use crate::core::hosts::normalize_hostname;
use crate::error::{BbError, Result};

/// Placeholder written in place of the Authorization value in logs.
const REDACTED: &str = "<redacted>";

/// Overall per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Redirect hops followed before giving up.
const MAX_REDIRECTS: usize = 10;

/// One outgoing request as seen by the interceptor chain.
///
/// `previous` is the URL of the request this one continues after a
/// redirect, threaded explicitly by the dispatcher so host-change
/// detection is a pure function of two request records.
pub struct PendingRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
    pub previous: Option<Url>,
}

impl PendingRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            previous: None,
        }
    }
}

/// A request/response transform pair in the chain.
pub trait Interceptor: Send + Sync {
    fn request(&self, req: &mut PendingRequest) -> Result<()>;

    fn response(&self, _req: &PendingRequest, _status: StatusCode, _headers: &HeaderMap) {}
}

/// Sets configured headers on the request, but only where absent; a
/// caller-supplied value is never overwritten.
pub struct DefaultHeaders {
    defaults: Vec<(HeaderName, HeaderValue)>,
}

impl DefaultHeaders {
    pub fn new() -> Self {
        Self {
            defaults: vec![
                (
                    USER_AGENT,
                    HeaderValue::from_static(concat!("bb/", env!("CARGO_PKG_VERSION"))),
                ),
                (ACCEPT, HeaderValue::from_static("application/json")),
            ],
        }
    }
}

impl Default for DefaultHeaders {
    fn default() -> Self {
        Self::new()
    }
}

impl Interceptor for DefaultHeaders {
    fn request(&self, req: &mut PendingRequest) -> Result<()> {
        for (name, value) in &self.defaults {
            if !req.headers.contains_key(name) {
                req.headers.insert(name.clone(), value.clone());
            }
        }
        Ok(())
    }
}

/// Logs requests and responses through `tracing`.
///
/// In verbose mode every header is enumerated; the Authorization value is
/// always replaced with a fixed placeholder.
pub struct RequestLogger {
    pub verbose: bool,
}

fn header_display(name: &HeaderName, value: &HeaderValue) -> String {
    if *name == AUTHORIZATION {
        REDACTED.to_string()
    } else {
        value.to_str().unwrap_or("<binary>").to_string()
    }
}

impl Interceptor for RequestLogger {
    fn request(&self, req: &mut PendingRequest) -> Result<()> {
        tracing::debug!("> {} {}", req.method, req.url);
        if self.verbose {
            for (name, value) in &req.headers {
                tracing::debug!("> {}: {}", name, header_display(name, value));
            }
        }
        Ok(())
    }

    fn response(&self, _req: &PendingRequest, status: StatusCode, headers: &HeaderMap) {
        tracing::debug!(
            "< {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        );
        if self.verbose {
            for (name, value) in headers {
                tracing::debug!("< {}: {}", name, header_display(name, value));
            }
        }
    }
}

/// Attaches the Basic credential for the request's host.
///
/// Skips injection when the caller already set an Authorization header
/// (supports unauthenticated probes with a caller-chosen value), and
/// strips any credential from a cross-host redirect continuation.
pub struct CredentialInjector {
    auth: AuthConfig,
}

impl CredentialInjector {
    pub fn new(auth: AuthConfig) -> Self {
        Self { auth }
    }
}

impl Interceptor for CredentialInjector {
    fn request(&self, req: &mut PendingRequest) -> Result<()> {
        if let Some(previous) = &req.previous {
            let prev_host = previous.host_str().map(normalize_hostname);
            let this_host = req.url.host_str().map(normalize_hostname);
            if prev_host != this_host {
                // Credentials never follow a cross-host redirect.
                req.headers.remove(AUTHORIZATION);
                return Ok(());
            }
        }

        if req.headers.contains_key(AUTHORIZATION) {
            return Ok(());
        }

        let Some(host) = req.url.host_str() else {
            return Ok(());
        };
        if let Some((credential, _)) = self.auth.active_credential(&normalize_hostname(host)) {
            let mut value = HeaderValue::from_str(&credential.basic_auth())
                .map_err(|e| BbError::Credential(e.to_string()))?;
            value.set_sensitive(true);
            req.headers.insert(AUTHORIZATION, value);
        }
        // A missing credential is not an error here; the caller sees the 401.
        Ok(())
    }
}

/// Dispatches requests through the interceptor chain and follows
/// redirects.
pub struct Transport {
    http: reqwest::Client,
    chain: Vec<Box<dyn Interceptor>>,
}

impl Transport {
    /// `chain` is ordered outermost-first: the first interceptor sees the
    /// request first and the response last.
    pub fn new(chain: Vec<Box<dyn Interceptor>>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .redirect(Policy::none())
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, chain })
    }

    pub async fn send(&self, mut req: PendingRequest) -> Result<reqwest::Response> {
        let mut hops = 0;
        loop {
            for interceptor in &self.chain {
                interceptor.request(&mut req)?;
            }

            let response = match self.http.execute(self.build(&req)?).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::debug!("x {} {}: {}", req.method, req.url, e);
                    return Err(e.into());
                }
            };

            for interceptor in self.chain.iter().rev() {
                interceptor.response(&req, response.status(), response.headers());
            }

            if response.status().is_redirection() {
                if let Some(location) = response.headers().get(LOCATION) {
                    hops += 1;
                    if hops > MAX_REDIRECTS {
                        return Err(BbError::TooManyRedirects(req.url.to_string()));
                    }
                    let target = location
                        .to_str()
                        .ok()
                        .and_then(|loc| req.url.join(loc).ok())
                        .ok_or_else(|| BbError::InvalidRedirect(req.url.to_string()))?;
                    req = redirect_continuation(req, target, response.status());
                    continue;
                }
            }

            return Ok(response);
        }
    }

    fn build(&self, req: &PendingRequest) -> Result<reqwest::Request> {
        let mut built = reqwest::Request::new(req.method.clone(), req.url.clone());
        *built.headers_mut() = req.headers.clone();
        if let Some(body) = &req.body {
            *built.body_mut() = Some(body.clone().into());
        }
        Ok(built)
    }
}

/// Build the follow-up request for a redirect.
///
/// 303, and 301/302 on POST, downgrade to GET and drop the body; 307/308
/// preserve both. The previous URL is threaded for host-change detection.
fn redirect_continuation(prev: PendingRequest, target: Url, status: StatusCode) -> PendingRequest {
    let downgrade = status == StatusCode::SEE_OTHER
        || ((status == StatusCode::MOVED_PERMANENTLY || status == StatusCode::FOUND)
            && prev.method == Method::POST);

    let (method, body) = if downgrade {
        (Method::GET, None)
    } else {
        (prev.method.clone(), prev.body.clone())
    };

    let mut headers = prev.headers.clone();
    if downgrade {
        headers.remove(CONTENT_TYPE);
    }

    PendingRequest {
        method,
        url: target,
        headers,
        body,
        previous: Some(prev.url),
    }
}
