//! Use cases orchestrating domain entities through port interfaces
//!
//! - [`ExpenseWriter`] - Online-first create/update/delete with offline
//!   fallback
//! - [`ExpenseReader`] - Merged remote + local expense view

pub mod read_expense;
pub mod write_expense;

pub use read_expense::{ExpenseReader, ExpenseView};
pub use write_expense::{ExpenseWriter, WriteOutcome};
