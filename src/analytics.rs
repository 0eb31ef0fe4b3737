//! Notifications API client - click/dismiss analytics and delivery retry

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Click analytics record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickEvent {
    pub notification_id: Option<String>,
    pub action: String,
    pub timestamp: String,
}

/// Dismissal analytics record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DismissEvent {
    pub tag: String,
    pub timestamp: String,
}

/// Current time as RFC 3339 UTC with millisecond precision
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Server-side notifications endpoints the agent calls
#[async_trait]
pub trait NotificationsApi: Send + Sync {
    /// Record a notification click
    async fn record_click(&self, event: &ClickEvent) -> Result<()>;

    /// Record a notification dismissed without a click
    async fn record_dismiss(&self, event: &DismissEvent) -> Result<()>;

    /// Ask the server to retry notification sends that previously failed
    async fn retry_failed(&self) -> Result<()>;
}

/// `reqwest`-backed notifications API
pub struct HttpNotificationsApi {
    client: reqwest::Client,
    base_url: url::Url,
    config: ApiConfig,
}

impl HttpNotificationsApi {
    /// Create a client for the configured API
    pub fn new(config: ApiConfig) -> Result<Self> {
        let base_url = url::Url::parse(&config.base_url)
            .map_err(|e| Error::Config(format!("invalid api base_url: {}", e)))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            config,
        })
    }

    fn endpoint(&self, path: &str) -> Result<url::Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("invalid api path {}: {}", path, e)))
    }

    async fn post(&self, path: &str, body: Option<&serde_json::Value>) -> Result<()> {
        let url = self.endpoint(path)?;
        let mut request = self.client.post(url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Api(format!("POST {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api(format!("POST {} returned {}", url, status)));
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationsApi for HttpNotificationsApi {
    async fn record_click(&self, event: &ClickEvent) -> Result<()> {
        let body = serde_json::to_value(event)?;
        self.post(&self.config.click_path, Some(&body)).await
    }

    async fn record_dismiss(&self, event: &DismissEvent) -> Result<()> {
        let body = serde_json::to_value(event)?;
        self.post(&self.config.dismiss_path, Some(&body)).await
    }

    async fn retry_failed(&self) -> Result<()> {
        self.post(&self.config.retry_path, None).await
    }
}
