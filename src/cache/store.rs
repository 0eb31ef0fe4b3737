//! Versioned cache store with optional file-based persistence
//!
//! Directory layout:
//! ```text
//! ~/.supperclub/cache/
//! ├── supperclub-v1/
//! │   ├── <sha256(key)>.json
//! │   └── ...
//! └── supperclub-v2/
//!     └── ...
//! ```

use crate::cache::types::ResourceResponse;
use crate::config::validate_namespace;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

type Namespaces = BTreeMap<String, HashMap<String, ResourceResponse>>;

/// One cache entry as written to disk
#[derive(Debug, Serialize, Deserialize)]
struct PersistedEntry {
    key: String,
    response: ResourceResponse,
}

/// Key → response store scoped by namespace.
///
/// All mutation goes through a single lock, which gives per-key atomicity to
/// concurrent handlers.
pub struct CacheStore {
    base_dir: Option<PathBuf>,
    namespaces: Arc<RwLock<Namespaces>>,
}

impl CacheStore {
    /// Create a store that lives only in memory
    pub fn in_memory() -> Self {
        Self {
            base_dir: None,
            namespaces: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Open a store backed by the given directory, loading existing namespaces
    pub async fn open(base_dir: PathBuf) -> Result<Self> {
        tokio::fs::create_dir_all(&base_dir).await?;

        let loaded = Self::load_from_disk(&base_dir);
        tracing::debug!(
            dir = %base_dir.display(),
            namespaces = loaded.len(),
            "Opened cache store"
        );

        Ok(Self {
            base_dir: Some(base_dir),
            namespaces: Arc::new(RwLock::new(loaded)),
        })
    }

    /// Default base directory (~/.supperclub/cache/)
    pub fn default_dir() -> PathBuf {
        dirs_next::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".supperclub")
            .join("cache")
    }

    /// Whether entries survive a restart
    pub fn is_persistent(&self) -> bool {
        self.base_dir.is_some()
    }

    // =========================================================================
    // Namespaces
    // =========================================================================

    /// All namespaces currently present, in sorted order
    pub async fn namespaces(&self) -> Vec<String> {
        self.namespaces.read().await.keys().cloned().collect()
    }

    /// Whether a namespace exists (possibly empty)
    pub async fn has_namespace(&self, namespace: &str) -> bool {
        self.namespaces.read().await.contains_key(namespace)
    }

    /// Delete a namespace and all its entries. Returns false if it did not exist.
    pub async fn delete_namespace(&self, namespace: &str) -> Result<bool> {
        let existed = self.namespaces.write().await.remove(namespace).is_some();

        if let Some(dir) = self.namespace_dir(namespace) {
            match tokio::fs::remove_dir_all(&dir).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(Error::Cache(format!(
                        "Failed to remove namespace {}: {}",
                        namespace, e
                    )))
                }
            }
        }

        Ok(existed)
    }

    // =========================================================================
    // Entries
    // =========================================================================

    /// Insert or replace a single entry
    pub async fn put(&self, namespace: &str, key: &str, response: ResourceResponse) -> Result<()> {
        self.put_all(namespace, vec![(key.to_string(), response)])
            .await
    }

    /// Insert or replace a batch of entries, creating the namespace if needed.
    ///
    /// Entries only become visible once every one of them has been written.
    pub async fn put_all(
        &self,
        namespace: &str,
        entries: Vec<(String, ResourceResponse)>,
    ) -> Result<()> {
        validate_namespace(namespace).map_err(|e| Error::Cache(e.to_string()))?;

        if let Some(dir) = self.namespace_dir(namespace) {
            tokio::fs::create_dir_all(&dir).await?;
            let mut written = Vec::with_capacity(entries.len());
            for (key, response) in &entries {
                match Self::persist_entry(&dir, key, response).await {
                    Ok(path) => written.push(path),
                    Err(e) => {
                        // Leave nothing of a failed batch for the next open to reload
                        for path in &written {
                            if let Err(e) = tokio::fs::remove_file(path).await {
                                tracing::warn!("Failed to remove {}: {}", path.display(), e);
                            }
                        }
                        return Err(e);
                    }
                }
            }
        }

        let mut namespaces = self.namespaces.write().await;
        let bucket = namespaces.entry(namespace.to_string()).or_default();
        for (key, response) in entries {
            bucket.insert(key, response);
        }

        Ok(())
    }

    /// Look up a key in one namespace
    pub async fn get(&self, namespace: &str, key: &str) -> Option<ResourceResponse> {
        self.namespaces
            .read()
            .await
            .get(namespace)
            .and_then(|bucket| bucket.get(key))
            .cloned()
    }

    /// Look up a key across every namespace
    pub async fn match_any(&self, key: &str) -> Option<ResourceResponse> {
        self.namespaces
            .read()
            .await
            .values()
            .find_map(|bucket| bucket.get(key))
            .cloned()
    }

    /// Keys stored under a namespace, sorted
    pub async fn keys(&self, namespace: &str) -> Vec<String> {
        let namespaces = self.namespaces.read().await;
        let mut keys: Vec<String> = namespaces
            .get(namespace)
            .map(|bucket| bucket.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    /// Number of entries under a namespace
    pub async fn len(&self, namespace: &str) -> usize {
        self.namespaces
            .read()
            .await
            .get(namespace)
            .map(HashMap::len)
            .unwrap_or(0)
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    fn namespace_dir(&self, namespace: &str) -> Option<PathBuf> {
        self.base_dir.as_ref().map(|base| base.join(namespace))
    }

    fn entry_file_name(key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        format!("{:x}.json", hasher.finalize())
    }

    async fn persist_entry(dir: &Path, key: &str, response: &ResourceResponse) -> Result<PathBuf> {
        let entry = PersistedEntry {
            key: key.to_string(),
            response: response.clone(),
        };
        let json = serde_json::to_vec(&entry)?;
        let path = dir.join(Self::entry_file_name(key));
        tokio::fs::write(&path, json).await.map_err(|e| {
            Error::Cache(format!("Failed to persist {} to {}: {}", key, path.display(), e))
        })?;
        Ok(path)
    }

    /// Load every namespace directory under the base directory
    fn load_from_disk(base_dir: &Path) -> Namespaces {
        let mut namespaces = BTreeMap::new();
        let dirs = match std::fs::read_dir(base_dir) {
            Ok(dirs) => dirs,
            Err(e) => {
                tracing::warn!("Failed to read cache directory {}: {}", base_dir.display(), e);
                return namespaces;
            }
        };

        for dir in dirs.flatten() {
            let path = dir.path();
            if !path.is_dir() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if validate_namespace(name).is_err() {
                tracing::warn!("Skipping unexpected cache directory {}", path.display());
                continue;
            }
            namespaces.insert(name.to_string(), Self::load_entries(&path));
        }

        namespaces
    }

    fn load_entries(dir: &Path) -> HashMap<String, ResourceResponse> {
        let mut entries = HashMap::new();
        let files = match std::fs::read_dir(dir) {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!("Failed to read directory {}: {}", dir.display(), e);
                return entries;
            }
        };

        for file in files.flatten() {
            let path = file.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match std::fs::read(&path) {
                Ok(data) => match serde_json::from_slice::<PersistedEntry>(&data) {
                    Ok(entry) => {
                        entries.insert(entry.key, entry.response);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse {}: {}", path.display(), e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", path.display(), e);
                }
            }
        }

        entries
    }
}
