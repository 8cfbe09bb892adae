//! Domain entities and business logic
//!
//! Core domain types for Ledgerly:
//! - Newtypes for type-safe identifiers and validated values
//! - The expense record entity and its lifecycle
//! - Queue entry types for pending remote operations
//! - The closed category set
//! - Domain-specific error types

pub mod category;
pub mod errors;
pub mod expense;
pub mod newtypes;
pub mod queue;

// Re-export commonly used types
pub use category::Category;
pub use errors::DomainError;
pub use expense::{ExpenseChanges, ExpenseDraft, ExpenseRecord};
pub use newtypes::{Amount, LocalId, OwnerId, RemoteRowId};
pub use queue::{Collection, ExpensePayload, OperationKind, QueueEntry, QueueOperation};
