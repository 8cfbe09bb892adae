//! Local record store port (driven/secondary port)
//!
//! Interface for durable, owner-scoped persistence of two independent
//! collections: locally created expenses that have not reached the remote
//! store yet, and the pending-operation queue.
//!
//! ## Design Notes
//!
//! - Read operations fail softly: unreadable or absent storage yields an
//!   empty result (logged by the adapter), never an error. This matches the
//!   read path's contract of never throwing into the UI.
//! - Write operations return `anyhow::Result` because storage errors are
//!   adapter-specific; a failed write is the signal the sync engine uses to
//!   abort a cycle as a process-level failure.
//! - Every mutation must be committed before the call returns: a caller
//!   that awaits a write and then crashes must not lose it.

use crate::domain::{
    expense::{ExpenseChanges, ExpenseDraft, ExpenseRecord},
    newtypes::{LocalId, OwnerId},
    queue::QueueEntry,
};

/// Counts of work still awaiting the remote store, per owner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingCounts {
    /// Locally held expenses with `synced == false`
    pub unsynced_expenses: u64,
    /// Queue entries with `synced == false`
    pub pending_operations: u64,
}

impl PendingCounts {
    /// Total items still awaiting sync
    #[must_use]
    pub fn total(&self) -> u64 {
        self.unsynced_expenses + self.pending_operations
    }

    /// True when nothing is waiting
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Port trait for the durable local record store
///
/// The only shared mutable resource between the interactive write path and
/// the sync engine. Implementations must make each call one scoped
/// transaction against the underlying storage so read-modify-write
/// sequences never interleave partially.
#[async_trait::async_trait]
pub trait IRecordStore: Send + Sync {
    // --- Expense operations ---

    /// Returns all locally held expenses for the owner whose synced flag is
    /// false, oldest first. Soft failure: storage problems yield an empty
    /// vec, never an error.
    async fn load_unsynced_expenses(&self, owner: &OwnerId) -> Vec<ExpenseRecord>;

    /// Persists a new unsynced expense, assigning it a fresh local id
    /// unique within the owner's scope. The commit completes before the
    /// call returns.
    async fn append_expense(
        &self,
        owner: &OwnerId,
        draft: ExpenseDraft,
    ) -> anyhow::Result<ExpenseRecord>;

    /// Flips the synced flag on a local record. Idempotent: marking an
    /// already-synced record is a no-op, not an error.
    async fn mark_expense_synced(&self, owner: &OwnerId, local_id: &LocalId)
        -> anyhow::Result<()>;

    /// Applies a partial edit to a local record (used when the record has
    /// not reached the remote store yet)
    async fn update_expense(
        &self,
        owner: &OwnerId,
        local_id: &LocalId,
        changes: &ExpenseChanges,
    ) -> anyhow::Result<()>;

    /// Permanently deletes a local record (local-only deletes and
    /// post-sync pruning)
    async fn remove_expense(&self, owner: &OwnerId, local_id: &LocalId) -> anyhow::Result<()>;

    /// Deletes synced expense rows that no queue entry references any
    /// more. A synced row is kept only as long as its audit entry; once
    /// the engine retires that entry the row is dead weight. Returns the
    /// number of rows removed.
    async fn prune_synced_expenses(&self, owner: &OwnerId) -> anyhow::Result<u64>;

    // --- Queue operations ---

    /// Returns the owner's queue entries in append (FIFO) order.
    /// Soft failure: storage problems yield an empty vec.
    async fn load_queue(&self, owner: &OwnerId) -> Vec<QueueEntry>;

    /// Appends one entry to the owner's queue
    async fn append_to_queue(&self, owner: &OwnerId, entry: &QueueEntry) -> anyhow::Result<()>;

    /// Atomically replaces the owner's queue with the given entries, in
    /// order, inside a single transaction. A crash mid-drain therefore
    /// leaves the previous consistent queue, never a partial one.
    async fn replace_queue(&self, owner: &OwnerId, entries: &[QueueEntry]) -> anyhow::Result<()>;

    // --- Bookkeeping ---

    /// Counts of unsynced expenses and pending queue entries.
    /// Soft failure: storage problems yield zero counts.
    async fn pending_counts(&self, owner: &OwnerId) -> PendingCounts;

    /// Wipes both collections for an owner (sign-out / reset)
    async fn clear_owner(&self, owner: &OwnerId) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_counts_total() {
        let counts = PendingCounts {
            unsynced_expenses: 2,
            pending_operations: 3,
        };
        assert_eq!(counts.total(), 5);
        assert!(!counts.is_empty());
        assert!(PendingCounts::default().is_empty());
    }
}
