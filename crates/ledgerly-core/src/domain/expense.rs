//! ExpenseRecord domain entity
//!
//! An expense lives through a simple lifecycle:
//!
//! ```text
//!     ┌───────────────┐   remote INSERT confirmed   ┌──────────────┐
//!     │ local, unsynced│ ─────────────────────────► │   synced     │
//!     │ (LocalId only) │                            │(RemoteRowId) │
//!     └───────────────┘                             └──────────────┘
//! ```
//!
//! Identity invariant: a record is addressed either by its remote row id
//! (once the remote store has confirmed it) or by its client-generated
//! [`LocalId`] with `synced == false`. After syncing, the local id is kept
//! only so queue entries can still correlate to it; it is never reused.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::category::Category;
use super::newtypes::{Amount, LocalId, OwnerId, RemoteRowId};

/// The caller-supplied portion of a new expense
///
/// Everything the interactive write path collects from the user; identifiers
/// and timestamps are filled in by whichever store persists the draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseDraft {
    pub amount: Amount,
    pub category: Category,
    pub description: String,
    pub date: NaiveDate,
}

/// A single expense record, local or remote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    /// Remote-assigned row id, present only once the remote write confirmed
    remote_id: Option<RemoteRowId>,
    /// Client-generated identifier, stable for the record's lifetime
    local_id: LocalId,
    /// Owner the record is partitioned by
    owner_id: OwnerId,
    /// Monetary amount, non-negative
    amount: Amount,
    /// One of the closed category set
    category: Category,
    /// Free-text description
    description: String,
    /// Calendar date of the expense (day granularity)
    date: NaiveDate,
    /// When the record was created on this device
    created_at: DateTime<Utc>,
    /// True once the remote store has confirmed persistence
    synced: bool,
}

impl ExpenseRecord {
    /// Creates a new unsynced local record from a draft
    ///
    /// The caller supplies the freshly assigned local id and creation
    /// instant so that the store controls both (a record is only considered
    /// created once the store's transaction commits).
    pub fn new_local(
        owner_id: OwnerId,
        local_id: LocalId,
        draft: ExpenseDraft,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            remote_id: None,
            local_id,
            owner_id,
            amount: draft.amount,
            category: draft.category,
            description: draft.description,
            date: draft.date,
            created_at,
            synced: false,
        }
    }

    /// Reconstructs a record that is already persisted remotely
    pub fn from_remote(
        remote_id: RemoteRowId,
        local_id: LocalId,
        owner_id: OwnerId,
        amount: Amount,
        category: Category,
        description: String,
        date: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            remote_id: Some(remote_id),
            local_id,
            owner_id,
            amount,
            category,
            description,
            date,
            created_at,
            synced: true,
        }
    }

    // --- Accessors ---

    pub fn remote_id(&self) -> Option<&RemoteRowId> {
        self.remote_id.as_ref()
    }

    pub fn local_id(&self) -> &LocalId {
        &self.local_id
    }

    pub fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_synced(&self) -> bool {
        self.synced
    }

    // --- Mutators ---

    /// Marks the record as confirmed remotely
    ///
    /// Idempotent: flipping an already-synced record is a no-op. The flag
    /// only ever moves false to true; there is no way back.
    pub fn mark_synced(&mut self) {
        self.synced = true;
    }

    /// Records the remote row id assigned by a confirmed INSERT
    pub fn set_remote_id(&mut self, remote_id: RemoteRowId) {
        self.remote_id = Some(remote_id);
    }

    /// Applies a partial edit to the record's user-facing fields
    pub fn apply_changes(&mut self, changes: &ExpenseChanges) {
        if let Some(amount) = changes.amount {
            self.amount = amount;
        }
        if let Some(category) = changes.category {
            self.category = category;
        }
        if let Some(ref description) = changes.description {
            self.description = description.clone();
        }
        if let Some(date) = changes.date {
            self.date = date;
        }
    }

    /// Checks the identity invariant: remote id known, or local-only and
    /// unsynced. A record violating this was corrupted in storage.
    pub fn identity_is_consistent(&self) -> bool {
        self.remote_id.is_some() || !self.synced
    }
}

/// A partial edit to an expense, shaped for UPDATE payloads
///
/// `None` fields are left untouched; `Some` fields overwrite.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl ExpenseChanges {
    /// True when no field is set (an empty patch)
    pub fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.date.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ExpenseDraft {
        ExpenseDraft {
            amount: Amount::new(1500.0).unwrap(),
            category: Category::Food,
            description: "Lunch".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        }
    }

    fn local_record() -> ExpenseRecord {
        let now = Utc::now();
        ExpenseRecord::new_local(OwnerId::new(), LocalId::generate(now), draft(), now)
    }

    #[test]
    fn test_new_local_is_unsynced() {
        let record = local_record();
        assert!(!record.is_synced());
        assert!(record.remote_id().is_none());
        assert!(record.identity_is_consistent());
    }

    #[test]
    fn test_mark_synced_is_idempotent() {
        let mut record = local_record();
        record.mark_synced();
        assert!(record.is_synced());
        // Second call is a no-op, not an error
        record.mark_synced();
        assert!(record.is_synced());
    }

    #[test]
    fn test_from_remote_is_synced() {
        let now = Utc::now();
        let record = ExpenseRecord::from_remote(
            RemoteRowId::new(42).unwrap(),
            LocalId::generate(now),
            OwnerId::new(),
            Amount::new(9.5).unwrap(),
            Category::Transport,
            "Bus".to_string(),
            NaiveDate::from_ymd_opt(2025, 3, 11).unwrap(),
            now,
        );
        assert!(record.is_synced());
        assert_eq!(record.remote_id().unwrap().value(), 42);
        assert!(record.identity_is_consistent());
    }

    #[test]
    fn test_identity_invariant_detects_corruption() {
        let mut record = local_record();
        // Synced without a known remote id breaks the one-of invariant
        record.mark_synced();
        assert!(!record.identity_is_consistent());
        record.set_remote_id(RemoteRowId::new(7).unwrap());
        assert!(record.identity_is_consistent());
    }

    #[test]
    fn test_apply_changes_partial() {
        let mut record = local_record();
        record.apply_changes(&ExpenseChanges {
            amount: Some(Amount::new(2000.0).unwrap()),
            description: Some("Dinner".to_string()),
            ..Default::default()
        });
        assert_eq!(record.amount().value(), 2000.0);
        assert_eq!(record.description(), "Dinner");
        assert_eq!(record.category(), Category::Food);
    }

    #[test]
    fn test_changes_is_empty() {
        assert!(ExpenseChanges::default().is_empty());
        let changes = ExpenseChanges {
            amount: Some(Amount::zero()),
            ..Default::default()
        };
        assert!(!changes.is_empty());
    }
}
