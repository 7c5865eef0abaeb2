//! Shared rate-limit hit counter.
//!
//! Every client cloned from the same guard shares one counter. Once the
//! configured number of HTTP 429 responses has been seen, further fetches
//! through any clone fail fast instead of hitting the network.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tracing::warn;

#[derive(Debug, Clone, Default)]
pub struct RateLimitGuard {
    hits: Arc<AtomicU32>,
    max_hits: Option<u32>,
}

impl RateLimitGuard {
    /// Guard that trips after `max_hits` rate-limit responses.
    pub fn new(max_hits: u32) -> Self {
        Self {
            hits: Arc::new(AtomicU32::new(0)),
            max_hits: Some(max_hits),
        }
    }

    /// Guard that counts hits but never trips.
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn from_config(max_hits: Option<u32>) -> Self {
        match max_hits {
            Some(max) => Self::new(max),
            None => Self::unlimited(),
        }
    }

    /// Check if a status code signals rate limiting.
    pub fn is_rate_limit(status: u16) -> bool {
        status == 429
    }

    /// Record one rate-limit response and return the running total.
    pub fn record_hit(&self, url: &str) -> u32 {
        let total = self.hits.fetch_add(1, Ordering::SeqCst) + 1;
        if self.max_hits.is_some_and(|max| total == max) {
            warn!(url, hits = total, "rate limit budget exhausted, halting fetches");
        }
        total
    }

    pub fn hits(&self) -> u32 {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn is_exceeded(&self) -> bool {
        self.max_hits.is_some_and(|max| self.hits() >= max)
    }
}
