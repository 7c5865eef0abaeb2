//! HTTP fetch layer with tiered retry.
//!
//! Protocol failures (non-2xx) and network failures (connect, timeout,
//! redirect) are counted separately, each with its own cap and backoff.
//! Any other request failure ends the call immediately. Backoff sleeps
//! are tokio sleeps, so other sessions keep running meanwhile.

mod transport;
mod user_agent;

pub use transport::{RawResponse, ReqwestTransport, Transport, TransportError};
pub use user_agent::{resolve_user_agent, BROWSER_USER_AGENTS};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use super::rate_limiter::RateLimitGuard;
use crate::config::Settings;

/// Status sentinel logged when a request never produced a response.
pub const NO_RESPONSE: &str = "no response";

/// Terminal outcome of a fetch.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("gave up after {attempts} HTTP failures (last status {last_status})")]
    ProtocolRetriesExhausted { attempts: u32, last_status: u16 },
    #[error("gave up after {attempts} network failures")]
    NetworkRetriesExhausted { attempts: u32 },
    #[error("request failed: {0}")]
    Fatal(String),
    #[error("rate limit budget exhausted")]
    RateLimitExceeded,
}

/// Attempt caps and backoff for the two retry tiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_protocol_attempts: u32,
    #[serde(with = "duration_secs")]
    pub protocol_backoff: Duration,
    pub max_network_attempts: u32,
    #[serde(with = "duration_secs")]
    pub network_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_protocol_attempts: 10,
            protocol_backoff: Duration::from_secs(1),
            max_network_attempts: 60,
            network_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Same caps, no waiting.
    pub fn immediate(self) -> Self {
        Self {
            protocol_backoff: Duration::ZERO,
            network_backoff: Duration::ZERO,
            ..self
        }
    }
}

pub(crate) mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

/// Something that turns a URL into page HTML.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Retrying HTTP client.
#[derive(Clone)]
pub struct HttpClient {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    rate_limit: RateLimitGuard,
}

impl HttpClient {
    /// Create a client over an arbitrary transport.
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            rate_limit: RateLimitGuard::unlimited(),
        }
    }

    /// Build the proxied reqwest client described by settings.
    pub fn from_settings(
        settings: &Settings,
        rate_limit: RateLimitGuard,
    ) -> Result<Self, reqwest::Error> {
        let transport = ReqwestTransport::new(
            &settings.proxy,
            Duration::from_secs(settings.request_timeout),
            settings.user_agent.as_deref(),
        )?;
        Ok(Self::new(Arc::new(transport), settings.retry).with_rate_limit(rate_limit))
    }

    /// Share a rate-limit guard with other clients.
    pub fn with_rate_limit(mut self, rate_limit: RateLimitGuard) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn rate_limit(&self) -> &RateLimitGuard {
        &self.rate_limit
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// GET `url`, retrying per policy, and return the body of the first 2xx.
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let mut protocol_attempts = 0u32;
        let mut network_attempts = 0u32;

        loop {
            if self.rate_limit.is_exceeded() {
                error!(url, status = NO_RESPONSE, "skipping request, rate limit exceeded");
                return Err(FetchError::RateLimitExceeded);
            }

            match self.transport.get(url).await {
                Ok(response) if response.is_success() => {
                    debug!(
                        url,
                        status = response.status,
                        bytes = response.body.len(),
                        "fetched"
                    );
                    return Ok(response.body);
                }
                Ok(response) => {
                    protocol_attempts += 1;
                    error!(
                        url,
                        status = response.status,
                        attempt = protocol_attempts,
                        "HTTP request failed"
                    );
                    if RateLimitGuard::is_rate_limit(response.status) {
                        self.rate_limit.record_hit(url);
                    }
                    if protocol_attempts >= self.policy.max_protocol_attempts {
                        return Err(FetchError::ProtocolRetriesExhausted {
                            attempts: protocol_attempts,
                            last_status: response.status,
                        });
                    }
                    tokio::time::sleep(self.policy.protocol_backoff).await;
                }
                Err(TransportError::Network(reason)) => {
                    network_attempts += 1;
                    error!(
                        url,
                        status = NO_RESPONSE,
                        attempt = network_attempts,
                        %reason,
                        "network error"
                    );
                    if network_attempts >= self.policy.max_network_attempts {
                        return Err(FetchError::NetworkRetriesExhausted {
                            attempts: network_attempts,
                        });
                    }
                    tokio::time::sleep(self.policy.network_backoff).await;
                }
                Err(TransportError::Fatal(reason)) => {
                    error!(url, status = NO_RESPONSE, %reason, "request failed");
                    return Err(FetchError::Fatal(reason));
                }
            }
        }
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.get_text(url).await
    }
}

#[async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for Arc<T> {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        (**self).fetch(url).await
    }
}
