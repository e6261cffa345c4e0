//! Configuration management for the sidecar.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support (TOML or JSON)
//! - Environment variable overrides
//! - Component-wise validation
mod backend;
mod log;
mod watch;
mod workspace;
pub use backend::*;
pub use log::*;
pub use watch::*;
pub use workspace::*;


use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;

/// Environment variable prefix for overrides, e.g. `PILOT__BACKEND__NAME`
pub const ENV_PREFIX: &str = "PILOT";

/// Main configuration container
///
/// Sources are merged with hierarchical override support:
/// 1. Default values from code implementation
/// 2. Configuration file specified by `CONFIG_PATH`
/// 3. Environment variables (highest priority)
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct PilotConfig {
    /// Discovery backend selection
    #[serde(default)]
    pub backend: BackendConfig,
    /// Prefix applied to every watch path
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    /// Log filter and destination
    #[serde(default)]
    pub log: LogConfig,
    /// Watched key-value namespaces
    #[serde(default)]
    pub watches: Vec<WatchSpec>,
}

impl PilotConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// # Note
    /// Callers MUST call `validate()` before building the application.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("CONFIG_PATH", "/etc/kvpilot/pilot.json");
    /// let cfg = PilotConfig::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(Self::environment());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies additional configuration overrides from file without validation.
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(Self::environment())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates configuration and returns validated instance.
    ///
    /// # Errors
    /// - Empty backend name
    /// - Unparseable log filter
    /// - Watch without path or with non-positive poll
    pub fn validate(self) -> Result<Self> {
        self.backend.validate()?;
        self.log.validate()?;
        for watch in &self.watches {
            watch.validate()?;
        }
        Ok(self)
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .ignore_empty(true)
            .try_parsing(true)
    }
}
