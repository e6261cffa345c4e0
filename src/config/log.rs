use std::path::PathBuf;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogConfig {
    /// `EnvFilter` directive. `RUST_LOG` takes precedence when set.
    #[serde(default = "default_filter")]
    pub filter: String,

    /// When set, logs are also written to `<dir>/kvpilot.log`
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            dir: None,
        }
    }
}

impl LogConfig {
    pub fn validate(&self) -> Result<()> {
        EnvFilter::try_new(&self.filter).map_err(|e| {
            Error::Config(ConfigError::Message(format!(
                "invalid log filter {:?}: {}",
                self.filter, e
            )))
        })?;

        if let Some(dir) = &self.dir {
            if dir.as_os_str().is_empty() {
                return Err(Error::Config(ConfigError::Message(
                    "log dir path cannot be empty".to_string(),
                )));
            }
        }
        Ok(())
    }
}

fn default_filter() -> String {
    "kvpilot=info".to_string()
}
