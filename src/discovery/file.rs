//! Directory-backed key-value backend.
//!
//! Every regular file under `root` is a key: its path relative to `root`,
//! joined with `/`, maps to the file's contents. This is the layout of a
//! mounted config volume and mirrors how hierarchical KV stores name keys.
//!
//! Symlinks are followed, so the key links of a projected volume resolve to
//! their current contents. Dot-prefixed entries (`..data`, `..2024_..`) are
//! skipped: they are the volume's internal layout, not keys.

use std::collections::HashSet;
use std::io;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use tracing::trace;

use super::KeyValuePair;
use super::KeyValueStore;
use super::ServiceBackend;
use super::ServiceDefinition;
use crate::BackendError;
use crate::Result;
use crate::ValidationError;

pub const FILE_BACKEND: &str = "file";

#[derive(Debug, Deserialize)]
struct FileBackendOptions {
    root: PathBuf,
}

pub struct FileBackend {
    store: Arc<FileKeyValueStore>,
}

impl FileBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            store: Arc::new(FileKeyValueStore { root: root.into() }),
        }
    }

    /// [`super::BackendConfigHook`] for the `file` backend. Requires a `root` option.
    pub fn from_options(options: &serde_json::Value) -> Result<Arc<dyn ServiceBackend>> {
        let options: FileBackendOptions =
            serde_json::from_value(options.clone()).map_err(|e| ValidationError::BackendOptions {
                backend: FILE_BACKEND.to_string(),
                reason: e.to_string(),
            })?;

        if options.root.as_os_str().is_empty() {
            return Err(ValidationError::BackendOptions {
                backend: FILE_BACKEND.to_string(),
                reason: "`root` cannot be empty".to_string(),
            }
            .into());
        }

        Ok(Arc::new(Self::new(options.root)))
    }
}

#[async_trait]
impl ServiceBackend for FileBackend {
    fn name(&self) -> String {
        FILE_BACKEND.to_string()
    }

    // A directory has no service catalog: registration calls are accepted
    // and dropped.
    async fn send_heartbeat(
        &self,
        service: &ServiceDefinition,
    ) -> Result<()> {
        debug!(service = %service.name, "file backend ignores heartbeat");
        Ok(())
    }

    async fn check_for_upstream_changes(
        &self,
        backend_name: &str,
        backend_tag: &str,
    ) -> Result<bool> {
        trace!(backend_name, backend_tag, "file backend has no upstreams");
        Ok(false)
    }

    async fn mark_for_maintenance(
        &self,
        service: &ServiceDefinition,
    ) -> Result<()> {
        debug!(service = %service.name, "file backend ignores maintenance");
        Ok(())
    }

    async fn deregister(
        &self,
        service: &ServiceDefinition,
    ) -> Result<()> {
        debug!(service = %service.name, "file backend ignores deregistration");
        Ok(())
    }

    fn key_value_store(&self) -> Option<Arc<dyn KeyValueStore>> {
        let store: Arc<dyn KeyValueStore> = self.store.clone();
        Some(store)
    }
}

pub struct FileKeyValueStore {
    root: PathBuf,
}

impl FileKeyValueStore {
    async fn walk(
        &self,
        start: PathBuf,
    ) -> io::Result<Vec<KeyValuePair>> {
        let mut pairs = Vec::new();

        let metadata = match tokio::fs::metadata(&start).await {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(pairs),
            Err(e) => return Err(e),
        };
        if metadata.is_file() {
            pairs.push(self.read_pair(&start).await?);
            return Ok(pairs);
        }

        // Canonical directories already walked; breaks symlink cycles
        let mut visited = HashSet::new();
        let mut pending = vec![start];
        while let Some(dir) = pending.pop() {
            if !visited.insert(tokio::fs::canonicalize(&dir).await?) {
                debug!(dir = %dir.display(), "directory already walked, skipping link cycle");
                continue;
            }

            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                if entry.file_name().to_string_lossy().starts_with('.') {
                    trace!(entry = %entry.path().display(), "skipping hidden entry");
                    continue;
                }

                let path = entry.path();
                // Follows symlinks, unlike `DirEntry::file_type`
                let metadata = match tokio::fs::metadata(&path).await {
                    Ok(m) => m,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {
                        debug!(entry = %path.display(), "skipping dangling symlink");
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                if metadata.is_dir() {
                    pending.push(path);
                } else if metadata.is_file() {
                    pairs.push(self.read_pair(&path).await?);
                }
            }
        }

        pairs.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(pairs)
    }

    async fn read_pair(
        &self,
        file: &Path,
    ) -> io::Result<KeyValuePair> {
        let bytes = tokio::fs::read(file).await?;
        Ok(KeyValuePair {
            key: self.key_for(file),
            value: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }

    fn key_for(
        &self,
        file: &Path,
    ) -> String {
        let relative = file.strip_prefix(&self.root).unwrap_or(file);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn list(
        &self,
        path: &str,
    ) -> Result<Vec<KeyValuePair>> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative.components().any(|c| !matches!(c, Component::Normal(_) | Component::CurDir)) {
            return Err(BackendError::Unavailable {
                path: path.to_string(),
                source: Box::new(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "path must stay below the backend root",
                )),
            }
            .into());
        }

        let start = self.root.join(relative);
        self.walk(start).await.map_err(|e| {
            BackendError::Unavailable {
                path: path.to_string(),
                source: Box::new(e),
            }
            .into()
        })
    }
}
