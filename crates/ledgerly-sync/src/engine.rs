//! Offline drain engine
//!
//! Pushes locally accumulated state to the remote store in two phases:
//! unsynced expense records first, then the pending-operation queue, FIFO
//! per collection. Each entry is classified individually; a terminal entry
//! is dropped from the pending set without blocking its siblings, while a
//! retryable failure halts only its own collection so causal order is
//! preserved for the next cycle.
//!
//! ## Cycle guarantees
//!
//! - At most one cycle runs per process at a time (atomic in-flight guard).
//! - No remote call is made while the connectivity oracle reports offline.
//! - A process-level failure (the local store rejecting a write) re-runs
//!   the whole cycle after a fixed delay, up to a bounded number of times.
//! - Write-back happens through `replace_queue`, one atomic swap per cycle.
//! - Synced entries are kept as an audit trail for a bounded window; past
//!   it they are retired, and local rows no entry references are pruned.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use ledgerly_core::config::Config;
use ledgerly_core::domain::newtypes::{LocalId, OwnerId};
use ledgerly_core::domain::{Collection, ExpensePayload, QueueEntry, QueueOperation};
use ledgerly_core::ports::{
    IConnectivity, IRecordStore, IRemoteStore, InsertOutcome, RemoteError,
};

/// Days a synced queue entry stays around as the audit trail. Older
/// entries are dropped during write-back, after which the synced local
/// rows they referenced become prunable.
const AUDIT_RETENTION_DAYS: i64 = 30;

// ============================================================================
// Outcome types
// ============================================================================

/// Tally of one completed sync cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    /// Records and entries confirmed by the remote store this cycle
    pub synced: u64,
    /// Items that failed retryably and stay pending
    pub failed: u64,
    /// Descriptions of terminally failed items removed from the pending set
    pub terminal: Vec<String>,
}

impl SyncReport {
    /// True when nothing failed in either class
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.terminal.is_empty()
    }
}

/// Result of a sync trigger
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// A cycle ran to completion
    Completed(SyncReport),
    /// Another cycle was already in flight; nothing was done
    AlreadyRunning,
    /// The connectivity oracle reported offline; nothing was done
    Offline,
}

// ============================================================================
// SyncEngine
// ============================================================================

/// Resets the in-flight flag when a cycle ends, however it ends
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drains offline state to the remote store
///
/// ## Dependencies
///
/// - `store`: the durable local record store (expenses + queue)
/// - `remote`: the remote store gateway
/// - `connectivity`: fail-closed reachability oracle
pub struct SyncEngine {
    store: Arc<dyn IRecordStore + Send + Sync>,
    remote: Arc<dyn IRemoteStore + Send + Sync>,
    connectivity: Arc<dyn IConnectivity + Send + Sync>,
    /// True while a cycle is in flight; later triggers are skipped
    in_flight: AtomicBool,
    /// Automatic re-runs after a process-level failure
    max_cycle_retries: u32,
    /// Fixed delay between those re-runs
    retry_delay: Duration,
}

impl SyncEngine {
    /// Creates a new engine with the given dependencies
    pub fn new(
        store: Arc<dyn IRecordStore + Send + Sync>,
        remote: Arc<dyn IRemoteStore + Send + Sync>,
        connectivity: Arc<dyn IConnectivity + Send + Sync>,
        config: &Config,
    ) -> Self {
        Self {
            store,
            remote,
            connectivity,
            in_flight: AtomicBool::new(false),
            max_cycle_retries: config.sync.max_cycle_retries,
            retry_delay: Duration::from_secs(config.sync.retry_delay_secs),
        }
    }

    /// Triggers a sync cycle for `owner`
    ///
    /// A second trigger while a cycle is in flight returns
    /// [`SyncOutcome::AlreadyRunning`] without touching the network. A
    /// process-level failure is retried up to the configured cap with a
    /// fixed delay; past the cap the error propagates to the caller and
    /// automatic retrying stops until the next external trigger.
    pub async fn sync(&self, owner: &OwnerId) -> Result<SyncOutcome> {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            debug!("sync already in flight, skipping trigger");
            return Ok(SyncOutcome::AlreadyRunning);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let mut attempt = 0u32;
        loop {
            match self.run_cycle(owner).await {
                Ok(outcome) => return Ok(outcome),
                Err(err) if attempt < self.max_cycle_retries => {
                    attempt += 1;
                    warn!(
                        error = %err,
                        attempt,
                        max = self.max_cycle_retries,
                        "sync cycle failed, retrying after delay"
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(err) => {
                    return Err(err.context(format!(
                        "sync cycle failed after {} retries",
                        self.max_cycle_retries
                    )));
                }
            }
        }
    }

    /// Runs one full drain cycle
    async fn run_cycle(&self, owner: &OwnerId) -> Result<SyncOutcome> {
        if !self.connectivity.is_online().await {
            debug!("offline, sync skipped");
            return Ok(SyncOutcome::Offline);
        }

        let records = self.store.load_unsynced_expenses(owner).await;
        let entries = self.store.load_queue(owner).await;
        let cutoff = chrono::Utc::now() - chrono::Duration::days(AUDIT_RETENTION_DAYS);
        let has_stale_audit = entries
            .iter()
            .any(|e| e.is_synced() && e.created_at() < cutoff);
        if records.is_empty() && entries.iter().all(QueueEntry::is_synced) && !has_stale_audit {
            debug!("nothing pending");
            return Ok(SyncOutcome::Completed(SyncReport::default()));
        }

        let mut report = SyncReport::default();

        // Phase 1: unsynced expense records. Each success leaves a synced
        // INSERT entry in the queue as the audit trail of how the row
        // reached the remote. Records whose pending INSERT already sits in
        // the queue get that entry marked in phase 2 instead of a new one.
        let queued_ids: HashSet<LocalId> = entries
            .iter()
            .filter_map(|e| e.local_id().cloned())
            .collect();
        let mut covered: HashSet<LocalId> = HashSet::new();
        let mut deferred: HashSet<LocalId> = HashSet::new();
        let mut poisoned: HashSet<LocalId> = HashSet::new();
        let mut audit_entries: Vec<QueueEntry> = Vec::new();
        for record in &records {
            let payload = ExpensePayload::from(record);
            match self.remote.insert_expense(owner, &payload).await {
                Ok(outcome) => {
                    if let InsertOutcome::Duplicate = outcome {
                        debug!(local_id = record.local_id().as_str(), "insert already applied remotely");
                    }
                    self.store
                        .mark_expense_synced(owner, record.local_id())
                        .await
                        .context("failed to mark expense synced")?;
                    covered.insert(record.local_id().clone());
                    if !queued_ids.contains(record.local_id()) {
                        // Timestamped at sync time: retention runs from
                        // when the row reached the remote
                        let mut audit = QueueEntry::new(
                            Collection::Expenses,
                            QueueOperation::Insert(payload),
                            *owner,
                            chrono::Utc::now(),
                        );
                        audit.mark_synced();
                        audit_entries.push(audit);
                    }
                    report.synced += 1;
                }
                Err(err) if err.is_retryable() => {
                    warn!(local_id = record.local_id().as_str(), error = %err, "insert failed, will retry");
                    deferred.insert(record.local_id().clone());
                    report.failed += 1;
                }
                Err(err) => {
                    warn!(local_id = record.local_id().as_str(), error = %err, "insert failed terminally");
                    poisoned.insert(record.local_id().clone());
                    report
                        .terminal
                        .push(format!("INSERT {}: {err}", record.local_id().as_str()));
                }
            }
        }

        // Phase 2: drain the pending queue FIFO per collection. A retryable
        // failure halts its collection to keep causal order; a terminal
        // failure drops only the poisoned entry.
        let mut halted_collections = HashSet::new();
        let mut next_queue: Vec<QueueEntry> = Vec::new();
        for mut entry in entries {
            if entry.is_synced() {
                // Audit trail with a bounded retention window
                if entry.created_at() >= cutoff {
                    next_queue.push(entry);
                }
                continue;
            }
            if halted_collections.contains(&entry.collection()) {
                next_queue.push(entry);
                continue;
            }
            // INSERTs attempted in phase 1 are not re-sent: successes are
            // only marked, retryable failures stay pending and halt their
            // collection, terminal failures drop the poisoned entry.
            if let Some(local_id) = entry.local_id() {
                if covered.contains(local_id) {
                    entry.mark_synced();
                    next_queue.push(entry);
                    continue;
                }
                if deferred.contains(local_id) {
                    halted_collections.insert(entry.collection());
                    next_queue.push(entry);
                    continue;
                }
                if poisoned.contains(local_id) {
                    continue;
                }
            }

            match self.dispatch(owner, &entry).await {
                Ok(()) => {
                    if let (QueueOperation::Insert(payload), Some(_)) =
                        (entry.operation(), entry.local_id())
                    {
                        // The local record (if still present) is now remote
                        let local_id = payload.local_id.clone();
                        self.store
                            .mark_expense_synced(owner, &local_id)
                            .await
                            .context("failed to mark expense synced")?;
                    }
                    entry.mark_synced();
                    report.synced += 1;
                    next_queue.push(entry);
                }
                Err(err) if err.is_retryable() => {
                    warn!(kind = %entry.kind(), error = %err, "queue entry failed, halting collection until next cycle");
                    report.failed += 1;
                    halted_collections.insert(entry.collection());
                    next_queue.push(entry);
                }
                Err(err) => {
                    warn!(kind = %entry.kind(), error = %err, "queue entry failed terminally, dropping");
                    report.terminal.push(format!("{}: {err}", entry.kind()));
                    // entry is not pushed: poison never blocks siblings
                }
            }
        }
        next_queue.extend(audit_entries);

        self.store
            .replace_queue(owner, &next_queue)
            .await
            .context("failed to write back sync queue")?;

        let pruned = self
            .store
            .prune_synced_expenses(owner)
            .await
            .context("failed to prune synced expenses")?;
        if pruned > 0 {
            debug!(pruned, "pruned synced local rows with no queue reference");
        }

        if report.is_clean() {
            info!(synced = report.synced, "sync cycle completed");
        } else {
            warn!(
                synced = report.synced,
                failed = report.failed,
                terminal = report.terminal.len(),
                "sync cycle completed with failures"
            );
        }
        Ok(SyncOutcome::Completed(report))
    }

    /// Sends one queue entry to the remote store
    async fn dispatch(&self, owner: &OwnerId, entry: &QueueEntry) -> Result<(), RemoteError> {
        match entry.operation() {
            QueueOperation::Insert(payload) => {
                // Duplicate collapses into success: the row is already there
                self.remote.insert_expense(owner, payload).await.map(|_| ())
            }
            QueueOperation::Update { remote_id, changes } => {
                self.remote.update_expense(owner, *remote_id, changes).await
            }
            QueueOperation::Delete { remote_id } => {
                self.remote.delete_expense(owner, *remote_id).await
            }
        }
    }
}
