//! Connectivity oracle port
//!
//! A single boolean question the sync engine asks before touching the
//! network. Answers are not cached: each call reflects current state.
//!
//! ## Fail-closed contract
//!
//! Implementations must never propagate a probe failure as an error or a
//! panic: any failure to establish reachability is reported as `false`.
//! The engine relies on this to guarantee that no remote call is ever
//! attempted while the device cannot reach the remote store.

/// Port trait for reachability checks against the remote store
#[async_trait::async_trait]
pub trait IConnectivity: Send + Sync {
    /// Returns whether the remote store is currently reachable.
    /// Failure of the check itself reports `false`.
    async fn is_online(&self) -> bool;
}
