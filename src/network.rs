//! Network layer used for install-time pre-population and cache misses

use crate::cache::{FetchRequest, ResourceResponse};
use crate::error::{Error, Result};
use async_trait::async_trait;

/// Performs a real network fetch for a request
#[async_trait]
pub trait Network: Send + Sync {
    /// Fetch a resource. Non-2xx statuses are returned as responses, not errors.
    async fn fetch(&self, request: &FetchRequest) -> Result<ResourceResponse>;
}

/// `reqwest`-backed network that resolves relative paths against an origin
pub struct HttpNetwork {
    client: reqwest::Client,
    origin: url::Url,
}

impl HttpNetwork {
    /// Create a network bound to an origin base URL
    pub fn new(origin: &str) -> Result<Self> {
        let origin = url::Url::parse(origin)
            .map_err(|e| Error::Config(format!("invalid origin {}: {}", origin, e)))?;
        Ok(Self {
            client: reqwest::Client::new(),
            origin,
        })
    }

    /// Resolve a request URL against the origin
    pub fn resolve(&self, url: &str) -> Result<url::Url> {
        self.origin
            .join(url)
            .map_err(|e| Error::Network(format!("invalid request url {}: {}", url, e)))
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<ResourceResponse> {
        let url = self.resolve(&request.url)?;
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| Error::Network(format!("invalid method {}: {}", request.method, e)))?;

        let response = self
            .client
            .request(method, url.clone())
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to fetch {}: {}", url, e)))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("Failed to read body of {}: {}", url, e)))?;

        tracing::debug!(url = %url, status, "Network fetch completed");

        Ok(ResourceResponse {
            status,
            headers,
            body,
        })
    }
}
