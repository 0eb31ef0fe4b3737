//! Lifecycle manager - install → activate → active
//!
//! Install pre-populates the current namespace from the manifest (all or
//! nothing). Activate prunes every other namespace. Only an active agent
//! handles fetch, push, click, close and sync events.

use crate::cache::{CacheStore, FetchRequest, ResourceResponse};
use crate::error::{Error, Result};
use crate::network::Network;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    /// Waiting for a successful install
    Installing,
    /// Installed; waiting for activation
    Activating,
    /// Handling events
    Active,
}

impl std::fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Installing => write!(f, "installing"),
            Self::Activating => write!(f, "activating"),
            Self::Active => write!(f, "active"),
        }
    }
}

/// Result of a completed install
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub namespace: String,
    pub cached: usize,
}

/// Result of a completed activation
#[derive(Debug, Clone, Serialize)]
pub struct ActivationReport {
    pub namespace: String,
    pub removed: Vec<String>,
}

/// Drives the agent through its lifecycle phases
pub struct LifecycleManager {
    namespace: String,
    manifest: Vec<String>,
    cache: Arc<CacheStore>,
    network: Arc<dyn Network>,
    phase: Arc<RwLock<LifecyclePhase>>,
    /// Serializes install attempts
    install_lock: Mutex<()>,
}

impl LifecycleManager {
    /// Create a manager in the `installing` phase
    pub fn new(
        namespace: impl Into<String>,
        manifest: Vec<String>,
        cache: Arc<CacheStore>,
        network: Arc<dyn Network>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            manifest,
            cache,
            network,
            phase: Arc::new(RwLock::new(LifecyclePhase::Installing)),
            install_lock: Mutex::new(()),
        }
    }

    /// The current namespace
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The pre-population manifest
    pub fn manifest(&self) -> &[String] {
        &self.manifest
    }

    /// Current phase
    pub async fn phase(&self) -> LifecyclePhase {
        *self.phase.read().await
    }

    /// Fail unless the agent is active
    pub async fn ensure_active(&self) -> Result<()> {
        match self.phase().await {
            LifecyclePhase::Active => Ok(()),
            phase => Err(Error::Lifecycle(format!(
                "agent is {}, events are handled only once active",
                phase
            ))),
        }
    }

    /// Pre-populate the current namespace with every manifest entry.
    ///
    /// Nothing is written unless all entries were fetched with a 2xx status.
    /// On failure the phase stays `installing` so the host can retry.
    pub async fn install(&self) -> Result<InstallReport> {
        let _installing = self.install_lock.lock().await;
        if self.phase().await == LifecyclePhase::Active {
            return Err(Error::Lifecycle(
                "agent is already active; install is not repeated".to_string(),
            ));
        }

        tracing::info!(
            namespace = %self.namespace,
            assets = self.manifest.len(),
            "Installing agent"
        );

        let fetches = self.manifest.iter().map(|path| self.fetch_manifest_entry(path));
        let entries = futures::future::try_join_all(fetches).await.map_err(|e| {
            tracing::error!(namespace = %self.namespace, error = %e, "Install failed");
            e
        })?;

        // Activation may have completed while the manifest was in flight
        let mut phase = self.phase.write().await;
        if *phase == LifecyclePhase::Active {
            return Err(Error::Lifecycle(
                "agent became active during install; result discarded".to_string(),
            ));
        }

        let cached = entries.len();
        self.cache
            .put_all(&self.namespace, entries)
            .await
            .map_err(|e| Error::Install(format!("Failed to store manifest: {}", e)))?;

        *phase = LifecyclePhase::Activating;
        drop(phase);

        tracing::info!(namespace = %self.namespace, cached, "Install complete");
        Ok(InstallReport {
            namespace: self.namespace.clone(),
            cached,
        })
    }

    async fn fetch_manifest_entry(&self, path: &str) -> Result<(String, ResourceResponse)> {
        let response = self
            .network
            .fetch(&FetchRequest::get(path))
            .await
            .map_err(|e| Error::Install(format!("{}: {}", path, e)))?;

        if !response.is_success() {
            return Err(Error::Install(format!(
                "{}: unexpected status {}",
                path, response.status
            )));
        }

        Ok((path.to_string(), response))
    }

    /// Delete every namespace except the current one and enter `active`
    pub async fn activate(&self) -> Result<ActivationReport> {
        let mut phase = self.phase.write().await;
        match *phase {
            LifecyclePhase::Activating => {}
            LifecyclePhase::Installing => {
                return Err(Error::Lifecycle(
                    "cannot activate before install completes".to_string(),
                ))
            }
            LifecyclePhase::Active => {
                return Err(Error::Lifecycle("agent is already active".to_string()))
            }
        }

        let mut removed = Vec::new();
        for namespace in self.cache.namespaces().await {
            if namespace == self.namespace {
                continue;
            }
            self.cache.delete_namespace(&namespace).await?;
            tracing::info!(namespace = %namespace, "Deleted stale cache namespace");
            removed.push(namespace);
        }

        *phase = LifecyclePhase::Active;

        tracing::info!(
            namespace = %self.namespace,
            removed = removed.len(),
            "Agent active"
        );
        Ok(ActivationReport {
            namespace: self.namespace.clone(),
            removed,
        })
    }
}
