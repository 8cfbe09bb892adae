//! Sync queue entry domain types
//!
//! A [`QueueEntry`] is a durable record of one pending remote write. Entries
//! are appended in causal order as the user acts and drained FIFO per
//! collection, so a later UPDATE can never overtake the INSERT that created
//! its row.
//!
//! The operation payload is a tagged sum type with one shape per operation
//! kind ([`QueueOperation`]); there is no runtime shape-guessing on a loose
//! JSON blob.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::category::Category;
use super::expense::{ExpenseChanges, ExpenseRecord};
use super::newtypes::{Amount, LocalId, OwnerId, RemoteRowId};

// ============================================================================
// Collection
// ============================================================================

/// Target collection a queue entry applies to
///
/// Ordering is guaranteed within a collection; across collections the drain
/// order is unspecified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Expenses,
    Budgets,
}

impl Collection {
    /// The remote table name for this collection
    #[must_use]
    pub fn table_name(&self) -> &'static str {
        match self {
            Collection::Expenses => "expenses",
            Collection::Budgets => "budgets",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table_name())
    }
}

// ============================================================================
// Operation payloads
// ============================================================================

/// Full row data for a pending INSERT
///
/// Carries the client [`LocalId`] as the idempotency token: the remote table
/// holds a unique constraint on `(user_id, local_id)`, so a replayed INSERT
/// whose first attempt actually committed collapses into a duplicate instead
/// of a second row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpensePayload {
    pub local_id: LocalId,
    pub amount: Amount,
    pub category: Category,
    pub description: String,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl From<&ExpenseRecord> for ExpensePayload {
    fn from(record: &ExpenseRecord) -> Self {
        Self {
            local_id: record.local_id().clone(),
            amount: record.amount(),
            category: record.category(),
            description: record.description().to_string(),
            date: record.date(),
            created_at: record.created_at(),
        }
    }
}

/// One pending remote operation, payload shaped per kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "data", rename_all = "snake_case")]
pub enum QueueOperation {
    /// Create a row; the payload is the whole row
    Insert(ExpensePayload),
    /// Patch an existing remote row
    Update {
        remote_id: RemoteRowId,
        changes: ExpenseChanges,
    },
    /// Remove an existing remote row
    Delete { remote_id: RemoteRowId },
}

impl QueueOperation {
    /// The operation kind without its payload
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self {
            QueueOperation::Insert(_) => OperationKind::Insert,
            QueueOperation::Update { .. } => OperationKind::Update,
            QueueOperation::Delete { .. } => OperationKind::Delete,
        }
    }
}

/// Discriminant of a [`QueueOperation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationKind {
    Insert,
    Update,
    Delete,
}

impl OperationKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Insert => "INSERT",
            OperationKind::Update => "UPDATE",
            OperationKind::Delete => "DELETE",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// QueueEntry
// ============================================================================

/// A durable record of one pending write awaiting remote confirmation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Collection the operation targets
    collection: Collection,
    /// The operation and its payload
    operation: QueueOperation,
    /// Local id of the record this entry correlates to (INSERTs always,
    /// UPDATE/DELETE when the target started life offline)
    local_id: Option<LocalId>,
    /// Owner the entry is partitioned by
    owner_id: OwnerId,
    /// Append instant, defines drain order within the collection
    created_at: DateTime<Utc>,
    /// True once the remote operation was confirmed
    synced: bool,
}

impl QueueEntry {
    /// Creates a new pending entry
    pub fn new(
        collection: Collection,
        operation: QueueOperation,
        owner_id: OwnerId,
        created_at: DateTime<Utc>,
    ) -> Self {
        let local_id = match &operation {
            QueueOperation::Insert(payload) => Some(payload.local_id.clone()),
            _ => None,
        };
        Self {
            collection,
            operation,
            local_id,
            owner_id,
            created_at,
            synced: false,
        }
    }

    // --- Accessors ---

    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn operation(&self) -> &QueueOperation {
        &self.operation
    }

    pub fn kind(&self) -> OperationKind {
        self.operation.kind()
    }

    pub fn local_id(&self) -> Option<&LocalId> {
        self.local_id.as_ref()
    }

    pub fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_synced(&self) -> bool {
        self.synced
    }

    // --- Mutators ---

    /// Marks the entry confirmed; one-way and idempotent
    pub fn mark_synced(&mut self) {
        self.synced = true;
    }

    /// Replaces the INSERT payload for an entry whose record was edited
    /// before it ever reached the remote store
    pub fn replace_insert_payload(&mut self, payload: ExpensePayload) {
        if matches!(self.operation, QueueOperation::Insert(_)) {
            self.local_id = Some(payload.local_id.clone());
            self.operation = QueueOperation::Insert(payload);
        }
    }
}
