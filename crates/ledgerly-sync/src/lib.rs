//! Ledgerly Sync - Offline-to-remote drain engine
//!
//! Provides:
//! - The sync engine draining unsynced expenses and the pending queue
//! - A fail-closed HTTP connectivity oracle
//! - A periodic scheduler with a manual-trigger flag
//!
//! ## Modules
//!
//! - [`engine`] - Single-flight sync cycle with retry classification
//! - [`connectivity`] - `IConnectivity` implementation probing the remote
//!   base URL
//! - [`scheduler`] - Periodic background trigger

pub mod connectivity;
pub mod engine;
pub mod scheduler;

pub use connectivity::HttpConnectivity;
pub use engine::{SyncEngine, SyncOutcome, SyncReport};
pub use scheduler::SyncScheduler;
