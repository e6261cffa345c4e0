use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::diff;
use super::ChangeSet;
use super::Notifier;
use super::Snapshot;
use crate::command::run_with_fields;
use crate::command::CommandDescriptor;
use crate::command::RunContext;
use crate::discovery::KeyValueStore;
use crate::discovery::ServiceBackend;
use crate::scheduler::Pollable;
use crate::BackendError;
use crate::Result;
use crate::WatchSpec;
use crate::WorkspaceConfig;

const ON_CHANGE_PROCESS: &str = "OnChange";

/// One watched key-value namespace.
///
/// Owns the last snapshot seen under its path. Every poll cycle lists the
/// path, diffs the listing against the snapshot, replaces the snapshot and,
/// when something changed, runs the on-change command and posts the change
/// set. The two side effects are independent of each other.
pub struct Watch {
    path: String,
    poll_interval: Duration,
    on_change: Option<CommandDescriptor>,
    post_url: Option<String>,
    store: Arc<dyn KeyValueStore>,
    notifier: Notifier,
    snapshot: Snapshot,
}

impl Watch {
    /// Builds a watch against `backend`'s key-value capability.
    ///
    /// # Errors
    /// Every error is a startup error: invalid declaration, malformed
    /// command or a backend without key-value support.
    pub fn new(
        spec: &WatchSpec,
        workspace: &WorkspaceConfig,
        backend: &dyn ServiceBackend,
        notifier: Notifier,
    ) -> Result<Self> {
        let store = backend
            .key_value_store()
            .ok_or_else(|| BackendError::CapabilityMismatch {
                backend: backend.name(),
                capability: "key-value",
            })?;
        Self::with_store(spec, workspace, store, notifier)
    }

    pub fn with_store(
        spec: &WatchSpec,
        workspace: &WorkspaceConfig,
        store: Arc<dyn KeyValueStore>,
        notifier: Notifier,
    ) -> Result<Self> {
        spec.validate()?;

        let path = workspace.normalize(&spec.path);
        let on_change =
            CommandDescriptor::parse(spec.on_change.as_ref(), spec.timeout.as_deref(), &path)?;

        Ok(Self {
            path,
            // validate() guarantees poll >= 1
            poll_interval: Duration::from_secs(spec.poll as u64),
            on_change,
            post_url: spec.post_url().map(str::to_string),
            store,
            notifier,
            snapshot: Snapshot::new(),
        })
    }

    /// Normalized path listed on every cycle
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn on_change(&self) -> Option<&CommandDescriptor> {
        self.on_change.as_ref()
    }

    pub fn post_url(&self) -> Option<&str> {
        self.post_url.as_deref()
    }

    /// Lists the path, diffs it against the stored snapshot and replaces the
    /// snapshot. On fetch failure the snapshot is left untouched.
    pub async fn check_for_changes(&mut self) -> Result<ChangeSet> {
        debug!(path = %self.path, "checking key-value changes");
        let fetched = self.store.list(&self.path).await?;

        let (changes, current) = diff(&self.path, &self.snapshot, fetched);
        self.snapshot = current;
        Ok(changes)
    }

    async fn run_on_change(&self) {
        let Some(descriptor) = &self.on_change else {
            return;
        };
        let context = RunContext::new(ON_CHANGE_PROCESS, self.path.clone());
        if let Err(e) = run_with_fields(descriptor, &context).await {
            warn!(path = %self.path, "on-change command failed: {}", e);
        }
    }

    async fn notify(
        &self,
        changes: &ChangeSet,
    ) {
        let Some(url) = &self.post_url else {
            debug!(path = %self.path, "no url to post");
            return;
        };
        if let Err(e) = self.notifier.post(url, changes).await {
            warn!(path = %self.path, %url, "change notification failed: {}", e);
        }
    }
}

#[async_trait]
impl Pollable for Watch {
    fn name(&self) -> &str {
        &self.path
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    async fn poll_action(&mut self) -> Result<()> {
        let changes = self.check_for_changes().await?;
        if changes.is_empty() {
            debug!(path = %self.path, "no key-value pairs changed");
            return Ok(());
        }

        info!(
            path = %self.path,
            additions = changes.additions.len(),
            modifications = changes.modifications.len(),
            deletions = changes.deletions.len(),
            "key-value pairs changed"
        );
        tokio::join!(self.run_on_change(), self.notify(&changes));
        Ok(())
    }
}
