//! Interactive expense write path
//!
//! Orchestrates create, update and delete of expenses with an online-first
//! strategy: try the remote gateway, and on any remote failure fall back to
//! the durable local store plus a queue entry for the sync engine to drain
//! later. Only a failure of both paths surfaces an error to the caller.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, warn};

use crate::domain::newtypes::{LocalId, OwnerId};
use crate::domain::queue::{Collection, ExpensePayload, QueueEntry, QueueOperation};
use crate::domain::{ExpenseChanges, ExpenseDraft, ExpenseRecord};
use crate::ports::{IConnectivity, IRecordStore, IRemoteStore, InsertOutcome};

/// Result of an interactive write
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOutcome {
    /// The record as it exists after the write
    pub record: ExpenseRecord,
    /// True when the write landed locally and awaits the sync engine;
    /// false when the remote store confirmed it directly
    pub queued: bool,
}

/// Use case for creating, editing and deleting expenses
///
/// ## Design Notes
///
/// - Edits and deletes of records that never reached the remote store are
///   applied to the local store and to the pending INSERT payload directly;
///   no UPDATE/DELETE is ever queued against a row the remote does not know.
/// - The connectivity oracle is consulted before each remote attempt so an
///   offline device skips straight to the local path without a doomed
///   network call.
pub struct ExpenseWriter {
    store: Arc<dyn IRecordStore + Send + Sync>,
    remote: Arc<dyn IRemoteStore + Send + Sync>,
    connectivity: Arc<dyn IConnectivity + Send + Sync>,
}

impl ExpenseWriter {
    pub fn new(
        store: Arc<dyn IRecordStore + Send + Sync>,
        remote: Arc<dyn IRemoteStore + Send + Sync>,
        connectivity: Arc<dyn IConnectivity + Send + Sync>,
    ) -> Self {
        Self {
            store,
            remote,
            connectivity,
        }
    }

    /// Creates a new expense, remote-first
    pub async fn create(&self, owner: &OwnerId, draft: ExpenseDraft) -> Result<WriteOutcome> {
        if self.connectivity.is_online().await {
            let now = Utc::now();
            let payload = ExpensePayload {
                local_id: LocalId::generate(now),
                amount: draft.amount,
                category: draft.category,
                description: draft.description.clone(),
                date: draft.date,
                created_at: now,
            };
            match self.remote.insert_expense(owner, &payload).await {
                Ok(InsertOutcome::Inserted(row)) => {
                    let record = row
                        .into_record()
                        .context("remote returned an invalid expense row")?;
                    debug!(remote_id = record.remote_id().map(|id| id.value()), "expense created remotely");
                    return Ok(WriteOutcome {
                        record,
                        queued: false,
                    });
                }
                // A duplicate on a fresh token cannot normally happen; fall
                // through to the local path and let the engine reconcile.
                Ok(InsertOutcome::Duplicate) => {
                    warn!("fresh insert reported duplicate, queueing locally");
                }
                Err(err) => {
                    warn!(error = %err, "remote insert failed, falling back to offline store");
                }
            }
        }

        // Offline path: durable local append plus a pending INSERT entry.
        let record = self
            .store
            .append_expense(owner, draft)
            .await
            .context("failed to store expense offline")?;
        let entry = QueueEntry::new(
            Collection::Expenses,
            QueueOperation::Insert(ExpensePayload::from(&record)),
            *owner,
            Utc::now(),
        );
        self.store
            .append_to_queue(owner, &entry)
            .await
            .context("failed to queue expense for sync")?;
        debug!(local_id = %record.local_id().as_str(), "expense stored offline");
        Ok(WriteOutcome {
            record,
            queued: true,
        })
    }

    /// Edits an existing expense
    pub async fn update(
        &self,
        owner: &OwnerId,
        record: &ExpenseRecord,
        changes: ExpenseChanges,
    ) -> Result<WriteOutcome> {
        let mut updated = record.clone();
        updated.apply_changes(&changes);

        // A record the remote never saw is edited in place; its pending
        // INSERT payload is rewritten so the eventual sync carries the
        // final values.
        let Some(remote_id) = record.remote_id().copied() else {
            self.store
                .update_expense(owner, record.local_id(), &changes)
                .await
                .context("failed to update offline expense")?;
            let mut entries = self.store.load_queue(owner).await;
            for entry in &mut entries {
                if entry.local_id() == Some(record.local_id()) {
                    entry.replace_insert_payload(ExpensePayload::from(&updated));
                }
            }
            self.store
                .replace_queue(owner, &entries)
                .await
                .context("failed to rewrite pending insert")?;
            return Ok(WriteOutcome {
                record: updated,
                queued: true,
            });
        };

        if self.connectivity.is_online().await {
            match self.remote.update_expense(owner, remote_id, &changes).await {
                Ok(()) => {
                    return Ok(WriteOutcome {
                        record: updated,
                        queued: false,
                    });
                }
                Err(err) => {
                    warn!(error = %err, remote_id = remote_id.value(), "remote update failed, queueing");
                }
            }
        }

        let entry = QueueEntry::new(
            Collection::Expenses,
            QueueOperation::Update { remote_id, changes },
            *owner,
            Utc::now(),
        );
        self.store
            .append_to_queue(owner, &entry)
            .await
            .context("failed to queue update for sync")?;
        Ok(WriteOutcome {
            record: updated,
            queued: true,
        })
    }

    /// Deletes an expense
    pub async fn delete(&self, owner: &OwnerId, record: &ExpenseRecord) -> Result<WriteOutcome> {
        // A local-only record disappears entirely: both the record and its
        // pending INSERT are dropped, nothing reaches the remote.
        let Some(remote_id) = record.remote_id().copied() else {
            self.store
                .remove_expense(owner, record.local_id())
                .await
                .context("failed to remove offline expense")?;
            let entries: Vec<_> = self
                .store
                .load_queue(owner)
                .await
                .into_iter()
                .filter(|entry| entry.local_id() != Some(record.local_id()))
                .collect();
            self.store
                .replace_queue(owner, &entries)
                .await
                .context("failed to drop pending insert")?;
            return Ok(WriteOutcome {
                record: record.clone(),
                queued: false,
            });
        };

        if self.connectivity.is_online().await {
            match self.remote.delete_expense(owner, remote_id).await {
                Ok(()) => {
                    return Ok(WriteOutcome {
                        record: record.clone(),
                        queued: false,
                    });
                }
                Err(err) => {
                    warn!(error = %err, remote_id = remote_id.value(), "remote delete failed, queueing");
                }
            }
        }

        let entry = QueueEntry::new(
            Collection::Expenses,
            QueueOperation::Delete { remote_id },
            *owner,
            Utc::now(),
        );
        self.store
            .append_to_queue(owner, &entry)
            .await
            .context("failed to queue delete for sync")?;
        Ok(WriteOutcome {
            record: record.clone(),
            queued: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use chrono::NaiveDate;

    use crate::domain::newtypes::{Amount, RemoteRowId};
    use crate::domain::Category;
    use crate::ports::{ExpenseRow, PendingCounts, RemoteError};

    #[derive(Default)]
    struct MemStore {
        expenses: Mutex<Vec<ExpenseRecord>>,
        queue: Mutex<Vec<QueueEntry>>,
    }

    #[async_trait::async_trait]
    impl crate::ports::IRecordStore for MemStore {
        async fn load_unsynced_expenses(&self, _: &OwnerId) -> Vec<ExpenseRecord> {
            self.expenses.lock().unwrap().clone()
        }
        async fn append_expense(
            &self,
            owner: &OwnerId,
            draft: ExpenseDraft,
        ) -> anyhow::Result<ExpenseRecord> {
            let now = Utc::now();
            let record = ExpenseRecord::new_local(*owner, LocalId::generate(now), draft, now);
            self.expenses.lock().unwrap().push(record.clone());
            Ok(record)
        }
        async fn mark_expense_synced(&self, _: &OwnerId, _: &LocalId) -> anyhow::Result<()> {
            Ok(())
        }
        async fn update_expense(
            &self,
            _: &OwnerId,
            local_id: &LocalId,
            changes: &ExpenseChanges,
        ) -> anyhow::Result<()> {
            for record in self.expenses.lock().unwrap().iter_mut() {
                if record.local_id() == local_id {
                    record.apply_changes(changes);
                }
            }
            Ok(())
        }
        async fn remove_expense(&self, _: &OwnerId, local_id: &LocalId) -> anyhow::Result<()> {
            self.expenses
                .lock()
                .unwrap()
                .retain(|r| r.local_id() != local_id);
            Ok(())
        }
        async fn prune_synced_expenses(&self, _: &OwnerId) -> anyhow::Result<u64> {
            Ok(0)
        }
        async fn load_queue(&self, _: &OwnerId) -> Vec<QueueEntry> {
            self.queue.lock().unwrap().clone()
        }
        async fn append_to_queue(&self, _: &OwnerId, entry: &QueueEntry) -> anyhow::Result<()> {
            self.queue.lock().unwrap().push(entry.clone());
            Ok(())
        }
        async fn replace_queue(&self, _: &OwnerId, entries: &[QueueEntry]) -> anyhow::Result<()> {
            *self.queue.lock().unwrap() = entries.to_vec();
            Ok(())
        }
        async fn pending_counts(&self, _: &OwnerId) -> PendingCounts {
            PendingCounts::default()
        }
        async fn clear_owner(&self, _: &OwnerId) -> anyhow::Result<()> {
            Ok(())
        }
    }

    /// Remote stub: succeeds or fails wholesale
    struct StubRemote {
        fail: bool,
    }

    #[async_trait::async_trait]
    impl crate::ports::IRemoteStore for StubRemote {
        async fn insert_expense(
            &self,
            owner: &OwnerId,
            payload: &ExpensePayload,
        ) -> Result<crate::ports::InsertOutcome, RemoteError> {
            if self.fail {
                return Err(RemoteError::ServerError("boom".to_string()));
            }
            Ok(crate::ports::InsertOutcome::Inserted(ExpenseRow {
                id: 1,
                user_id: *owner,
                local_id: Some(payload.local_id.as_str().to_string()),
                amount: payload.amount.value(),
                category: payload.category.as_str().to_string(),
                description: payload.description.clone(),
                date: payload.date,
                is_synced: true,
                created_at: payload.created_at,
            }))
        }
        async fn update_expense(
            &self,
            _: &OwnerId,
            _: RemoteRowId,
            _: &ExpenseChanges,
        ) -> Result<(), RemoteError> {
            if self.fail {
                return Err(RemoteError::ServerError("boom".to_string()));
            }
            Ok(())
        }
        async fn delete_expense(&self, _: &OwnerId, _: RemoteRowId) -> Result<(), RemoteError> {
            if self.fail {
                return Err(RemoteError::ServerError("boom".to_string()));
            }
            Ok(())
        }
        async fn list_expenses(
            &self,
            _: &OwnerId,
            _: NaiveDate,
            _: NaiveDate,
        ) -> Result<Vec<ExpenseRow>, RemoteError> {
            Ok(Vec::new())
        }
    }

    struct StubOracle(AtomicBool);

    #[async_trait::async_trait]
    impl crate::ports::IConnectivity for StubOracle {
        async fn is_online(&self) -> bool {
            self.0.load(Ordering::Acquire)
        }
    }

    fn writer(online: bool, remote_fails: bool) -> (ExpenseWriter, Arc<MemStore>) {
        let store = Arc::new(MemStore::default());
        let writer = ExpenseWriter::new(
            Arc::clone(&store) as Arc<dyn IRecordStore + Send + Sync>,
            Arc::new(StubRemote { fail: remote_fails }),
            Arc::new(StubOracle(AtomicBool::new(online))),
        );
        (writer, store)
    }

    fn draft() -> ExpenseDraft {
        ExpenseDraft {
            amount: Amount::new(1500.0).unwrap(),
            category: Category::Food,
            description: "Lunch".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_create_online_goes_remote() {
        let (writer, store) = writer(true, false);
        let outcome = writer.create(&OwnerId::new(), draft()).await.unwrap();
        assert!(!outcome.queued);
        assert!(outcome.record.is_synced());
        assert!(store.queue.lock().unwrap().is_empty());
        assert!(store.expenses.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_offline_queues_locally() {
        let (writer, store) = writer(false, false);
        let outcome = writer.create(&OwnerId::new(), draft()).await.unwrap();
        assert!(outcome.queued);
        assert!(!outcome.record.is_synced());
        assert_eq!(store.expenses.lock().unwrap().len(), 1);
        let queue = store.queue.lock().unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].local_id(), Some(outcome.record.local_id()));
    }

    #[tokio::test]
    async fn test_create_falls_back_when_remote_fails() {
        let (writer, store) = writer(true, true);
        let outcome = writer.create(&OwnerId::new(), draft()).await.unwrap();
        assert!(outcome.queued);
        assert_eq!(store.expenses.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_local_record_rewrites_pending_insert() {
        let (writer, store) = writer(false, false);
        let owner = OwnerId::new();
        let created = writer.create(&owner, draft()).await.unwrap();

        let changes = ExpenseChanges {
            description: Some("Dinner".to_string()),
            ..Default::default()
        };
        let updated = writer.update(&owner, &created.record, changes).await.unwrap();
        assert!(updated.queued);
        assert_eq!(updated.record.description(), "Dinner");

        // Still a single INSERT in the queue, carrying the new values
        let queue = store.queue.lock().unwrap();
        assert_eq!(queue.len(), 1);
        match queue[0].operation() {
            QueueOperation::Insert(payload) => assert_eq!(payload.description, "Dinner"),
            other => panic!("unexpected operation: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_synced_record_offline_queues_update() {
        let (writer, store) = writer(false, false);
        let owner = OwnerId::new();
        let record = ExpenseRecord::from_remote(
            RemoteRowId::new(7).unwrap(),
            LocalId::generate(Utc::now()),
            owner,
            Amount::new(10.0).unwrap(),
            Category::Misc,
            "Old".to_string(),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            Utc::now(),
        );

        let changes = ExpenseChanges {
            amount: Some(Amount::new(20.0).unwrap()),
            ..Default::default()
        };
        let outcome = writer.update(&owner, &record, changes).await.unwrap();
        assert!(outcome.queued);

        let queue = store.queue.lock().unwrap();
        assert_eq!(queue.len(), 1);
        assert!(matches!(
            queue[0].operation(),
            QueueOperation::Update { remote_id, .. } if remote_id.value() == 7
        ));
    }

    #[tokio::test]
    async fn test_delete_local_record_drops_record_and_insert() {
        let (writer, store) = writer(false, false);
        let owner = OwnerId::new();
        let created = writer.create(&owner, draft()).await.unwrap();

        let outcome = writer.delete(&owner, &created.record).await.unwrap();
        // Nothing left to sync: the remote never saw this record
        assert!(!outcome.queued);
        assert!(store.expenses.lock().unwrap().is_empty());
        assert!(store.queue.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_synced_record_offline_queues_delete() {
        let (writer, store) = writer(false, false);
        let owner = OwnerId::new();
        let record = ExpenseRecord::from_remote(
            RemoteRowId::new(3).unwrap(),
            LocalId::generate(Utc::now()),
            owner,
            Amount::new(10.0).unwrap(),
            Category::Misc,
            "Bye".to_string(),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            Utc::now(),
        );

        let outcome = writer.delete(&owner, &record).await.unwrap();
        assert!(outcome.queued);
        let queue = store.queue.lock().unwrap();
        assert!(matches!(
            queue[0].operation(),
            QueueOperation::Delete { remote_id } if remote_id.value() == 3
        ));
    }
}
