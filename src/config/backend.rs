use serde::Deserialize;
use serde::Serialize;

use crate::discovery::FILE_BACKEND;
use crate::Result;
use crate::ValidationError;

/// Selects the discovery backend and carries its options.
///
/// ```toml
/// [backend]
/// name = "file"
///
/// [backend.options]
/// root = "/etc/kvpilot/data"
/// ```
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BackendConfig {
    /// Registry name of the backend
    #[serde(default = "default_backend_name")]
    pub name: String,

    /// Passed untouched to the backend's config hook
    #[serde(default)]
    pub options: serde_json::Value,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            name: default_backend_name(),
            options: serde_json::Value::Null,
        }
    }
}

impl BackendConfig {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyBackendName.into());
        }
        Ok(())
    }
}

fn default_backend_name() -> String {
    FILE_BACKEND.to_string()
}
