//! Fixed-delay poll scheduler.
//!
//! Every registered [`Pollable`] gets its own task for the lifetime of the
//! scheduler. A task runs one cycle, sleeps for the entity's interval and
//! repeats, so a slow cycle pushes the next one out instead of overlapping
//! it. Errors and panics raised by a cycle are logged and swallowed by the
//! task; they never reach the scheduler or a sibling task.
//!
//! Stopping is cooperative: a cycle already running is allowed to finish.


use std::panic::AssertUnwindSafe;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::utils::async_task::panic_message;
use crate::utils::async_task::spawn_task;
use crate::Result;

/// Entity driven by the [`PollScheduler`].
#[async_trait]
pub trait Pollable: Send + 'static {
    /// Label used in log lines
    fn name(&self) -> &str;

    /// Delay between the end of one cycle and the start of the next
    fn poll_interval(&self) -> Duration;

    /// One cycle. Never runs concurrently with itself.
    async fn poll_action(&mut self) -> Result<()>;

    /// Called once after the last cycle when the scheduler stops.
    async fn poll_stop(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Cloneable trigger for [`PollScheduler::stop`], usable after the
/// scheduler itself has been moved into `run`.
#[derive(Debug, Clone)]
pub struct StopHandle {
    token: CancellationToken,
}

impl StopHandle {
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[derive(Default)]
pub struct PollScheduler {
    pollables: Vec<Box<dyn Pollable>>,
    shutdown: CancellationToken,
}

impl PollScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity. Only possible before [`PollScheduler::run`], which
    /// takes the scheduler by value.
    pub fn register(
        &mut self,
        pollable: Box<dyn Pollable>,
    ) {
        debug!(
            name = pollable.name(),
            interval = ?pollable.poll_interval(),
            "pollable registered"
        );
        self.pollables.push(pollable);
    }

    pub fn len(&self) -> usize {
        self.pollables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pollables.is_empty()
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            token: self.shutdown.clone(),
        }
    }

    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    /// Starts one task per entity and blocks until stopped. Returns once
    /// every task has finished its in-flight cycle and exited.
    pub async fn run(self) {
        let Self { pollables, shutdown } = self;
        info!(count = pollables.len(), "poll scheduler started");

        let handles: Vec<_> = pollables
            .into_iter()
            .map(|pollable| {
                let name = pollable.name().to_string();
                spawn_task(&name, poll_loop(pollable, shutdown.clone()))
            })
            .collect();

        shutdown.cancelled().await;
        info!("poll scheduler stopping, waiting for in-flight cycles");

        for result in join_all(handles).await {
            if let Err(e) = result {
                error!("poll task terminated abnormally: {:?}", e);
            }
        }
        info!("poll scheduler stopped");
    }
}

async fn poll_loop(
    mut pollable: Box<dyn Pollable>,
    shutdown: CancellationToken,
) -> Result<()> {
    let name = pollable.name().to_string();
    let interval = pollable.poll_interval();

    while !shutdown.is_cancelled() {
        match AssertUnwindSafe(pollable.poll_action()).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(%name, "poll cycle failed: {}", e),
            Err(payload) => error!(%name, "poll cycle panicked: {}", panic_message(payload.as_ref())),
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    debug!(%name, "poll loop exiting");
    pollable.poll_stop().await
}
