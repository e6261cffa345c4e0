use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::ServiceBackend;
use crate::Result;
use crate::ValidationError;

/// Constructs a backend from the free-form `backend.options` config table.
pub type BackendConfigHook = fn(&serde_json::Value) -> Result<Arc<dyn ServiceBackend>>;

/// Maps backend names to their constructor hooks.
///
/// Filled during bootstrap and only read afterwards. It is not meant to be
/// mutated once the application is built.
#[derive(Default)]
pub struct BackendRegistry {
    hooks: HashMap<String, BackendConfigHook>,
    /// Registration order, each name listed once
    names: Vec<String>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `hook` under `name`. A second registration for the same
    /// name replaces the hook but keeps the original listing position.
    pub fn register_backend(
        &mut self,
        name: &str,
        hook: BackendConfigHook,
    ) {
        debug!(backend = name, "Service discovery hook registered");
        if self.hooks.insert(name.to_string(), hook).is_none() {
            self.names.push(name.to_string());
        }
    }

    pub fn get_config_hook(
        &self,
        name: &str,
    ) -> Option<BackendConfigHook> {
        self.hooks.get(name).copied()
    }

    /// Registered backend names in registration order
    pub fn list_backends(&self) -> &[String] {
        &self.names
    }

    /// Resolves `name` and runs its hook against `options`.
    pub fn build_backend(
        &self,
        name: &str,
        options: &serde_json::Value,
    ) -> Result<Arc<dyn ServiceBackend>> {
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyBackendName.into());
        }
        let hook = self
            .get_config_hook(name)
            .ok_or_else(|| ValidationError::UnknownBackend(name.to_string()))?;
        hook(options)
    }
}
