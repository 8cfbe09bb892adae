//! Merged expense read path
//!
//! Produces the view the UI shows: remote rows for a date range combined
//! with locally held records the remote has not seen yet. The read path
//! never throws; a failing remote simply narrows the view to local data.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::warn;

use crate::domain::newtypes::OwnerId;
use crate::domain::ExpenseRecord;
use crate::ports::{IConnectivity, IRecordStore, IRemoteStore};

/// The merged expense view for one date range
#[derive(Debug, Clone)]
pub struct ExpenseView {
    /// Records in the range, newest first
    pub records: Vec<ExpenseRecord>,
    /// False when the remote could not be reached and only local records
    /// are shown
    pub includes_remote: bool,
}

/// Use case for listing expenses across both stores
pub struct ExpenseReader {
    store: Arc<dyn IRecordStore + Send + Sync>,
    remote: Arc<dyn IRemoteStore + Send + Sync>,
    connectivity: Arc<dyn IConnectivity + Send + Sync>,
}

impl ExpenseReader {
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

    /// Lists expenses within an inclusive date range
    pub async fn list(&self, owner: &OwnerId, from: NaiveDate, to: NaiveDate) -> ExpenseView {
        let mut records = Vec::new();
        let mut includes_remote = false;

        if self.connectivity.is_online().await {
            match self.remote.list_expenses(owner, from, to).await {
                Ok(rows) => {
                    includes_remote = true;
                    for row in rows {
                        match row.into_record() {
                            Ok(record) => records.push(record),
                            Err(err) => {
                                warn!(error = %err, "skipping malformed remote row");
                            }
                        }
                    }
                }
                Err(err) => {
                    warn!(error = %err, "remote list failed, showing local records only");
                }
            }
        }

        let remote_local_ids: Vec<_> = records.iter().map(|r| r.local_id().clone()).collect();
        for record in self.store.load_unsynced_expenses(owner).await {
            // A record that already appears in the remote result was synced
            // but not yet pruned locally; show the remote copy.
            if record.date() >= from
                && record.date() <= to
                && !remote_local_ids.contains(record.local_id())
            {
                records.push(record);
            }
        }

        records.sort_by(|a, b| b.date().cmp(&a.date()).then(b.created_at().cmp(&a.created_at())));
        ExpenseView {
            records,
            includes_remote,
        }
    }
}
