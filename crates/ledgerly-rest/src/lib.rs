//! Ledgerly REST - Remote store gateway
//!
//! PostgREST-style HTTP adapter for the remote expense table.
//!
//! ## Architecture
//!
//! This crate implements the `IRemoteStore` port from `ledgerly-core`
//! against a PostgREST-compatible API. It is a driven (secondary) adapter
//! in the hexagonal architecture.
//!
//! ## Key Components
//!
//! - [`RestClient`] - Typed HTTP client with auth headers and error
//!   classification
//! - [`RestRemoteStore`] - Full `IRemoteStore` implementation with a
//!   TTL-cached owner lookup

pub mod client;
pub mod gateway;

pub use client::RestClient;
pub use gateway::RestRemoteStore;
