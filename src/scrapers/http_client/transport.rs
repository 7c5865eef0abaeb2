//! Single-request transport beneath the retry loop.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Proxy};
use thiserror::Error;
use tracing::{debug, warn};

use super::user_agent::resolve_user_agent;
use crate::config::ProxyConfig;

/// Status and body of one completed request.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// How a request failed before producing a response.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Connection, timeout, redirect, or body read failure. Worth retrying.
    #[error("network error: {0}")]
    Network(String),
    /// Anything else the request layer rejects.
    #[error("request failed: {0}")]
    Fatal(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() || e.is_redirect() || e.is_body() {
            TransportError::Network(e.to_string())
        } else {
            TransportError::Fatal(e.to_string())
        }
    }
}

/// Issues one GET and reports what came back.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<RawResponse, TransportError>;
}

/// reqwest transport, optionally routed through the rendering proxy.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(
        proxy: &ProxyConfig,
        timeout: Duration,
        user_agent: Option<&str>,
    ) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder()
            .user_agent(resolve_user_agent(user_agent))
            .timeout(timeout)
            .gzip(true)
            .brotli(true);

        if let Some(proxy_url) = proxy.proxy_url() {
            debug!(endpoint = %proxy.endpoint, "routing requests through proxy");
            builder = builder
                .proxy(Proxy::all(&proxy_url)?)
                .danger_accept_invalid_certs(proxy.accept_invalid_certs)
                .default_headers(render_headers(proxy.render_header.as_deref()));
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

fn render_headers(header: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let Some((name, value)) = header.and_then(|h| h.split_once(':')) else {
        return headers;
    };
    match (
        HeaderName::from_bytes(name.trim().as_bytes()),
        HeaderValue::from_str(value.trim()),
    ) {
        (Ok(name), Ok(value)) => {
            headers.insert(name, value);
        }
        _ => warn!(header = ?header, "ignoring malformed proxy render header"),
    }
    headers
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<RawResponse, TransportError> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(RawResponse { status, body })
    }
}
