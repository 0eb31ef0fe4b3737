//! Request interceptor - static cache-first, then network
//!
//! Cached entries are served without a freshness check and only change on the
//! next install/activate cycle. Network responses are passed through untouched
//! and are never written back to the cache.

use crate::cache::{CacheStore, FetchRequest, ResourceResponse};
use crate::error::Result;
use crate::network::Network;
use serde::Serialize;
use std::sync::Arc;

/// Where a fetch was answered from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchSource {
    Cache,
    Network,
}

/// Response to an intercepted fetch
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub response: ResourceResponse,
    pub source: FetchSource,
}

/// Applies the cache-first policy to outgoing fetches
pub struct RequestInterceptor {
    cache: Arc<CacheStore>,
    network: Arc<dyn Network>,
}

impl RequestInterceptor {
    /// Create a new interceptor
    pub fn new(cache: Arc<CacheStore>, network: Arc<dyn Network>) -> Self {
        Self { cache, network }
    }

    /// Answer a fetch from the cache if possible, otherwise from the network.
    ///
    /// A network failure on a cache miss is returned unmodified.
    pub async fn handle(&self, request: &FetchRequest) -> Result<FetchOutcome> {
        if let Some(key) = request.cache_key() {
            if let Some(response) = self.cache.match_any(key).await {
                tracing::debug!(url = %request.url, "Cache hit");
                return Ok(FetchOutcome {
                    response,
                    source: FetchSource::Cache,
                });
            }
        }

        tracing::debug!(method = %request.method, url = %request.url, "Cache miss, forwarding");
        let response = self.network.fetch(request).await?;
        Ok(FetchOutcome {
            response,
            source: FetchSource::Network,
        })
    }
}
