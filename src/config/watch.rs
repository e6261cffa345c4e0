use serde::Deserialize;
use serde::Serialize;

use crate::Result;
use crate::ValidationError;

/// Declaration of one watched namespace, as written in the config file.
///
/// ```json
/// { "path": "app/config", "poll": 5,
///   "onChange": ["/usr/local/bin/reload"], "timeout": "30s",
///   "onChangePostUrl": "http://127.0.0.1:8080/changes" }
/// ```
///
/// Missing `path`/`poll` deserialize to empty values and are rejected by
/// [`WatchSpec::validate`], so every problem surfaces at construction.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct WatchSpec {
    #[serde(default)]
    pub path: String,

    /// Poll interval in seconds
    #[serde(default)]
    pub poll: i64,

    /// Command line string or argv array
    #[serde(
        default,
        rename = "onChange",
        alias = "onchange",
        alias = "on_change",
        skip_serializing_if = "Option::is_none"
    )]
    pub on_change: Option<serde_json::Value>,

    /// Duration string for the on-change command, e.g. `"10s"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    #[serde(
        default,
        rename = "onChangePostUrl",
        alias = "onchangeposturl",
        alias = "on_change_post_url",
        skip_serializing_if = "Option::is_none"
    )]
    pub on_change_post_url: Option<String>,
}

impl WatchSpec {
    pub fn validate(&self) -> Result<()> {
        if self.path.trim().is_empty() {
            return Err(ValidationError::EmptyPath.into());
        }
        if self.path.split('/').any(|segment| segment.trim() == "..") {
            return Err(ValidationError::PathEscapesRoot(self.path.clone()).into());
        }
        if self.poll < 1 {
            return Err(ValidationError::InvalidPoll {
                path: self.path.clone(),
                poll: self.poll,
            }
            .into());
        }
        Ok(())
    }

    /// Notification target, `None` when absent or blank
    pub fn post_url(&self) -> Option<&str> {
        self.on_change_post_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}
