//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IRecordStore`] - Durable local storage for unsynced expenses and the
//!   pending-operation queue
//! - [`IRemoteStore`] - Remote expense CRUD (PostgREST-style HTTP adapter)
//! - [`IConnectivity`] - Fail-closed reachability oracle

pub mod connectivity;
pub mod record_store;
pub mod remote_store;

pub use connectivity::IConnectivity;
pub use record_store::{IRecordStore, PendingCounts};
pub use remote_store::{ExpenseRow, IRemoteStore, InsertOutcome, RemoteError};
