//! Remote store gateway port (driven/secondary port)
//!
//! Interface for CRUD against the remote `expenses` table, always scoped to
//! the authenticated owner. The primary implementation targets a
//! PostgREST-style HTTP API, but the trait is provider-agnostic.
//!
//! ## Error taxonomy
//!
//! Unlike the local store port, this port uses a typed error because the
//! sync engine's retry classification depends on it:
//!
//! | Error                 | Class     | Engine behavior                    |
//! |-----------------------|-----------|------------------------------------|
//! | `NotAuthenticated`    | terminal  | surfaced, forces re-login          |
//! | `NetworkUnavailable`  | retryable | entry retained for next cycle      |
//! | `ConstraintViolation` | terminal  | surfaced, entry removed from queue |
//! | `ServerError`         | retryable | entry retained, bounded backoff    |

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    expense::{ExpenseChanges, ExpenseRecord},
    newtypes::{Amount, LocalId, OwnerId, RemoteRowId},
    queue::ExpensePayload,
    Category, DomainError,
};

// ============================================================================
// RemoteError
// ============================================================================

/// Typed failure of a remote store operation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RemoteError {
    /// No valid session; terminal until the user logs in again
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The request never reached the server (DNS, connect, offline)
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    /// The server rejected the data (duplicate key, invalid foreign key);
    /// retrying the same payload can never succeed
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// 5xx-equivalent or request-timeout expiry; transient
    #[error("Server error: {0}")]
    ServerError(String),
}

impl RemoteError {
    /// True if a later retry of the same operation may succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RemoteError::NetworkUnavailable(_) | RemoteError::ServerError(_)
        )
    }

    /// True if the error can never succeed on retry and must be surfaced
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !self.is_retryable()
    }
}

// ============================================================================
// Port-level DTOs
// ============================================================================

/// A persisted row of the remote `expenses` table
///
/// Port-level DTO, not a domain entity; callers map it to [`ExpenseRecord`]
/// via [`ExpenseRow::into_record`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRow {
    pub id: i64,
    pub user_id: OwnerId,
    pub local_id: Option<String>,
    pub amount: f64,
    pub category: String,
    pub description: String,
    pub date: NaiveDate,
    pub is_synced: bool,
    pub created_at: DateTime<Utc>,
}

impl ExpenseRow {
    /// Maps the raw row into a validated domain record
    pub fn into_record(self) -> Result<ExpenseRecord, DomainError> {
        let remote_id = RemoteRowId::new(self.id)?;
        let local_id = match self.local_id {
            Some(token) => LocalId::new(token)?,
            // Rows created online before idempotency tokens existed carry
            // no local id; synthesize a stable one from the row id.
            None => LocalId::new(format!("remote_{}", self.id))?,
        };
        Ok(ExpenseRecord::from_remote(
            remote_id,
            local_id,
            self.user_id,
            Amount::new(self.amount)?,
            self.category.parse::<Category>()?,
            self.description,
            self.date,
            self.created_at,
        ))
    }
}

/// Result of an INSERT attempt
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    /// A new row was created
    Inserted(ExpenseRow),
    /// The idempotency token already exists remotely: a previous attempt
    /// committed but its acknowledgment was lost. The write is durable;
    /// treat as success.
    Duplicate,
}

// ============================================================================
// IRemoteStore trait
// ============================================================================

/// Port trait for remote expense persistence
///
/// Implementations must bound each request's wait with a configured timeout
/// and classify expiry as `ServerError` (retryable) rather than hanging.
#[async_trait::async_trait]
pub trait IRemoteStore: Send + Sync {
    /// Inserts one expense row
    ///
    /// The payload's local id is the idempotency token; the remote table's
    /// unique constraint on it collapses lost-acknowledgment replays into
    /// [`InsertOutcome::Duplicate`].
    async fn insert_expense(
        &self,
        owner: &OwnerId,
        payload: &ExpensePayload,
    ) -> Result<InsertOutcome, RemoteError>;

    /// Patches an existing row
    async fn update_expense(
        &self,
        owner: &OwnerId,
        remote_id: RemoteRowId,
        changes: &ExpenseChanges,
    ) -> Result<(), RemoteError>;

    /// Deletes an existing row
    async fn delete_expense(
        &self,
        owner: &OwnerId,
        remote_id: RemoteRowId,
    ) -> Result<(), RemoteError>;

    /// Selects the owner's rows within an inclusive date range, newest
    /// first (the interactive read path merges these with local unsynced
    /// records)
    async fn list_expenses(
        &self,
        owner: &OwnerId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ExpenseRow>, RemoteError>;
}
