//! Sidecar Error Hierarchy
//!
//! Errors are split by where they can occur. Validation and configuration
//! errors only happen at startup and are fatal. Backend, command and
//! notification errors happen inside one poll cycle and are logged by the
//! cycle that produced them.

use std::time::Duration;

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration loading or deserialization failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Watch declaration or backend selection rejected at construction time
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Discovery backend failures
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// On-change command failures
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Change notification delivery failures
    #[error(transparent)]
    Notification(#[from] NotificationError),

    /// Unrecoverable failures requiring process termination
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("watch must have a `path`")]
    EmptyPath,

    #[error("watch path {0:?} must not contain `..` segments")]
    PathEscapesRoot(String),

    #[error("`poll` must be > 0 in watch {path}, got {poll}")]
    InvalidPoll { path: String, poll: i64 },

    #[error("could not parse `onChange` in watch {path}: {reason}")]
    MalformedCommand { path: String, reason: String },

    #[error("could not parse `timeout` in watch {path}: {value:?}")]
    InvalidTimeout { path: String, value: String },

    #[error("backend name cannot be empty")]
    EmptyBackendName,

    #[error("no backend registered under name {0:?}")]
    UnknownBackend(String),

    #[error("invalid options for backend {backend}: {reason}")]
    BackendOptions { backend: String, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Fetch failed; the watch keeps its previous snapshot
    #[error("backend unavailable while listing {path}: {source}")]
    Unavailable {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The backend cannot serve the capability a watch requires
    #[error("backend {backend} does not provide the {capability} capability")]
    CapabilityMismatch {
        backend: String,
        capability: &'static str,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process was killed after exceeding its timeout
    #[error("{program} timed out after {after:?}")]
    Timeout { program: String, after: Duration },

    #[error("{program} exited with code {code}")]
    NonZeroExit { program: String, code: i32 },
}

impl CommandError {
    /// Exit code reported for this failure, `-1` when the process never produced one.
    pub fn exit_code(&self) -> i32 {
        match self {
            CommandError::NonZeroExit { code, .. } => *code,
            _ => -1,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("failed to encode change set: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to post to {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
}
