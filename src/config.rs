//! Agent configuration management

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main agent configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Cache store configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Application origin the network layer fetches from
    #[serde(default)]
    pub origin: OriginConfig,

    /// Notification presentation defaults
    #[serde(default)]
    pub notifications: NotificationsConfig,

    /// Notifications API collaborator
    #[serde(default)]
    pub api: ApiConfig,

    /// Background retry configuration
    #[serde(default)]
    pub retry: RetryConfig,

    /// Host bridge configuration
    #[serde(default)]
    pub bridge: BridgeConfig,
}

impl AgentConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the agent cannot run with
    pub fn validate(&self) -> Result<()> {
        validate_namespace(&self.cache.namespace)?;

        for path in &self.cache.manifest {
            if path.trim().is_empty() {
                return Err(Error::Config("manifest contains an empty path".to_string()));
            }
        }

        url::Url::parse(&self.origin.base_url)
            .map_err(|e| Error::Config(format!("invalid origin.base_url: {}", e)))?;
        url::Url::parse(&self.api.base_url)
            .map_err(|e| Error::Config(format!("invalid api.base_url: {}", e)))?;
        url::Url::parse(&self.notifications.map_search_url)
            .map_err(|e| Error::Config(format!("invalid notifications.map_search_url: {}", e)))?;

        if self.retry.sync_tag.is_empty() {
            return Err(Error::Config("retry.sync_tag must not be empty".to_string()));
        }

        Ok(())
    }
}

/// Namespaces double as directory names on disk, so keep them to a safe alphabet
pub fn validate_namespace(namespace: &str) -> Result<()> {
    if namespace.is_empty() {
        return Err(Error::Config("cache namespace must not be empty".to_string()));
    }
    if namespace.starts_with('.')
        || !namespace
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(Error::Config(format!(
            "invalid cache namespace '{}': use letters, digits, '-', '_' or '.'",
            namespace
        )));
    }
    Ok(())
}

/// Cache store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Current cache namespace (version tag)
    pub namespace: String,

    /// Critical assets pre-populated on install
    pub manifest: Vec<String>,

    /// On-disk storage directory (in-memory only when unset)
    pub storage_dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            namespace: "supperclub-v1".to_string(),
            manifest: default_manifest(),
            storage_dir: None,
        }
    }
}

/// Document shell, core bundle, stylesheet, icon and badge
pub fn default_manifest() -> Vec<String> {
    vec![
        "/".to_string(),
        "/static/js/bundle.js".to_string(),
        "/static/css/main.css".to_string(),
        "/icon-192x192.png".to_string(),
        "/badge-72x72.png".to_string(),
    ]
}

/// Application origin configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginConfig {
    /// Base URL request paths are resolved against
    pub base_url: String,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
        }
    }
}

/// Notification presentation defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Title used when a payload has none
    pub app_name: String,

    /// Icon used when a payload has none
    pub default_icon: String,

    /// Badge used when a payload has none
    pub default_badge: String,

    /// Tag used when a payload carries no type
    pub default_tag: String,

    /// Map search URL prefix; the encoded address is appended
    pub map_search_url: String,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            app_name: "Supper Club".to_string(),
            default_icon: "/icon-192x192.png".to_string(),
            default_badge: "/badge-72x72.png".to_string(),
            default_tag: "supperclub-notification".to_string(),
            map_search_url: "https://www.google.com/maps/search/?api=1&query=".to_string(),
        }
    }
}

/// Notifications API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API base URL
    pub base_url: String,

    /// Click analytics endpoint
    pub click_path: String,

    /// Dismissal analytics endpoint
    pub dismiss_path: String,

    /// Failed-delivery retry endpoint
    pub retry_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            click_path: "/api/notifications/click".to_string(),
            dismiss_path: "/api/notifications/dismiss".to_string(),
            retry_path: "/api/notifications/retry-failed".to_string(),
        }
    }
}

/// Background retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// The only sync tag that triggers a retry dispatch
    pub sync_tag: String,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            sync_tag: "retry-failed-notifications".to_string(),
        }
    }
}

/// Host bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 18791,
        }
    }
}
