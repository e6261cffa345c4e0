//! Discovery backend capabilities and the registry that resolves them.
//!
//! A backend is anything that implements [`ServiceBackend`]. Watches never
//! see the concrete type: they ask the backend for its [`KeyValueStore`]
//! once, at construction, and only ever call `list` on it afterwards.
//!
//! Backends are made available through an explicit [`bootstrap`] call that
//! fills a [`BackendRegistry`] before any configuration is read.

mod file;
mod registry;
pub use file::*;
pub use registry::*;


use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;

/// One entry returned by a key-value listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValuePair {
    pub key: String,
    pub value: String,
}

impl KeyValuePair {
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Service registered with a discovery backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceDefinition {
    pub id: String,
    pub name: String,
    pub port: u16,
    /// Heartbeat TTL in seconds
    pub ttl: u32,
    pub tags: Vec<String>,
    pub ip_address: String,
}

/// Read access to a key-value namespace.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Lists every key under `path` with its value, ordered by key.
    ///
    /// Latency is bounded by the implementation; callers apply no timeout.
    async fn list(
        &self,
        path: &str,
    ) -> Result<Vec<KeyValuePair>>;
}

/// Capabilities every discovery backend exposes.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ServiceBackend: Send + Sync + 'static {
    /// Name the backend was registered under
    fn name(&self) -> String;

    async fn send_heartbeat(
        &self,
        service: &ServiceDefinition,
    ) -> Result<()>;

    /// Returns true when the upstream service set changed since the last call
    async fn check_for_upstream_changes(
        &self,
        backend_name: &str,
        backend_tag: &str,
    ) -> Result<bool>;

    async fn mark_for_maintenance(
        &self,
        service: &ServiceDefinition,
    ) -> Result<()>;

    async fn deregister(
        &self,
        service: &ServiceDefinition,
    ) -> Result<()>;

    /// Key-value capability of this backend, if it has one
    fn key_value_store(&self) -> Option<Arc<dyn KeyValueStore>>;
}

/// Builds a registry holding every backend shipped with this crate.
///
/// Must run before configuration is parsed so the backend name in the
/// config can be resolved to a constructor.
pub fn bootstrap() -> BackendRegistry {
    let mut registry = BackendRegistry::new();
    registry.register_backend(FILE_BACKEND, FileBackend::from_options);
    registry
}
