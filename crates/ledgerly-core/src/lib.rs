//! Ledgerly Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `ExpenseRecord`, `QueueEntry`, the closed
//!   `Category` set and validated newtypes
//! - **Use cases** - `ExpenseWriter` (online-first writes with offline
//!   fallback), `ExpenseReader` (merged views)
//! - **Port definitions** - Traits for adapters: `IRecordStore`,
//!   `IRemoteStore`, `IConnectivity`
//! - **Configuration** - Typed YAML-backed `Config`
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no external dependencies.
//! Ports define trait interfaces that adapter crates implement.
//! Use cases orchestrate domain entities through port interfaces.

pub mod cache;
pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;
