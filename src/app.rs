//! Application wiring: backend resolution, watch construction and the
//! scheduler that drives them.

use tracing::info;

use crate::discovery::BackendRegistry;
use crate::scheduler::PollScheduler;
use crate::scheduler::StopHandle;
use crate::watch::Notifier;
use crate::watch::Watch;
use crate::PilotConfig;
use crate::Result;

/// Fully constructed sidecar, ready to run.
///
/// Building is the only place where configuration errors surface: once
/// `build` returns, every watch has a valid path, interval and command.
pub struct App {
    scheduler: PollScheduler,
}

impl App {
    /// Resolves the configured backend through `registry`, then constructs
    /// every watch. Fails on the first invalid watch.
    pub fn build(
        config: &PilotConfig,
        registry: &BackendRegistry,
    ) -> Result<Self> {
        info!(
            backend = %config.backend.name,
            available = ?registry.list_backends(),
            "resolving discovery backend"
        );
        let backend = registry.build_backend(&config.backend.name, &config.backend.options)?;
        let notifier = Notifier::new()?;

        let mut scheduler = PollScheduler::new();
        for spec in &config.watches {
            let watch = Watch::new(spec, &config.workspace, backend.as_ref(), notifier.clone())?;
            info!(
                path = watch.path(),
                poll = spec.poll,
                on_change = watch.on_change().is_some(),
                post_url = ?watch.post_url(),
                "watch configured"
            );
            scheduler.register(Box::new(watch));
        }

        Ok(Self { scheduler })
    }

    /// Number of configured watches
    pub fn watch_count(&self) -> usize {
        self.scheduler.len()
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.scheduler.stop_handle()
    }

    /// Blocks until the [`StopHandle`] fires and every in-flight cycle has
    /// completed.
    pub async fn run(self) -> Result<()> {
        if self.scheduler.is_empty() {
            info!("no watches configured, idling until stopped");
        }
        self.scheduler.run().await;
        Ok(())
    }
}
