//! Periodic sync scheduler
//!
//! Drives the engine on a fixed interval and exposes a manual-trigger flag
//! so a foreground command can request an immediate cycle. The first cycle
//! runs at startup; background cycles are silent on success, logged on
//! transient failure, and surfaced when the retry cap is exhausted.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use ledgerly_core::domain::newtypes::OwnerId;

use crate::engine::{SyncEngine, SyncOutcome};

/// How often the manual-trigger flag is polled between interval ticks
const TRIGGER_POLL: Duration = Duration::from_millis(500);

/// Runs sync cycles periodically for one owner
///
/// Calling [`request_sync()`](SyncScheduler::request_sync) sets the shared
/// flag; the run loop picks it up within [`TRIGGER_POLL`] and starts a cycle
/// without waiting for the next interval tick.
pub struct SyncScheduler {
    engine: Arc<SyncEngine>,
    owner: OwnerId,
    /// Set by `request_sync`, cleared when the requested cycle starts
    sync_requested: Arc<AtomicBool>,
    poll_interval: Duration,
}

impl SyncScheduler {
    /// Creates a scheduler and returns it together with the shared trigger
    /// flag
    pub fn new(
        engine: Arc<SyncEngine>,
        owner: OwnerId,
        poll_interval: Duration,
    ) -> (Self, Arc<AtomicBool>) {
        let sync_requested = Arc::new(AtomicBool::new(false));
        debug!(
            poll_secs = poll_interval.as_secs(),
            "sync scheduler created"
        );
        (
            Self {
                engine,
                owner,
                sync_requested: Arc::clone(&sync_requested),
                poll_interval,
            },
            sync_requested,
        )
    }

    /// Requests an immediate cycle from outside the run loop
    pub fn request_sync(&self) {
        self.sync_requested.store(true, Ordering::Release);
    }

    /// Returns whether a manual cycle is currently requested
    pub fn is_sync_requested(&self) -> bool {
        self.sync_requested.load(Ordering::Acquire)
    }

    /// Runs indefinitely: one cycle immediately, then one per interval
    /// tick, plus any manually requested cycles in between
    pub async fn run(&self) {
        let mut poll_timer = tokio::time::interval(self.poll_interval);
        let mut trigger_timer = tokio::time::interval(TRIGGER_POLL);

        loop {
            tokio::select! {
                _ = poll_timer.tick() => {
                    self.run_once().await;
                }
                _ = trigger_timer.tick() => {
                    if self.sync_requested.swap(false, Ordering::AcqRel) {
                        self.run_once().await;
                    }
                }
            }
        }
    }

    /// Executes one cycle, translating outcomes into log lines
    async fn run_once(&self) {
        match self.engine.sync(&self.owner).await {
            Ok(SyncOutcome::Completed(report)) => {
                if !report.terminal.is_empty() {
                    warn!(
                        synced = report.synced,
                        terminal = report.terminal.len(),
                        "background sync dropped terminally failed entries"
                    );
                } else if report.failed > 0 {
                    warn!(
                        synced = report.synced,
                        failed = report.failed,
                        "background sync left retryable entries pending"
                    );
                } else if report.synced > 0 {
                    info!(synced = report.synced, "background sync completed");
                }
            }
            Ok(SyncOutcome::Offline) => debug!("background sync skipped, offline"),
            Ok(SyncOutcome::AlreadyRunning) => debug!("background sync skipped, already running"),
            Err(err) => error!(error = %err, "background sync gave up after retries"),
        }
    }
}
