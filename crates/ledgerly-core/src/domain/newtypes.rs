//! Domain newtypes with validation
//!
//! Strongly-typed wrappers for domain identifiers and values. Each newtype
//! ensures data validity at construction time:
//!
//! - [`OwnerId`] - the authenticated user all records are partitioned by
//! - [`LocalId`] - client-generated token identifying a record until the
//!   remote store assigns the authoritative row id; doubles as the
//!   idempotency token attached to INSERT payloads
//! - [`RemoteRowId`] - remote-assigned primary key of a persisted row
//! - [`Amount`] - non-negative monetary amount

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

// ============================================================================
// OwnerId
// ============================================================================

/// Identifier for the authenticated owner of records and queue entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(Uuid);

impl OwnerId {
    /// Create a new random OwnerId
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an OwnerId from an existing UUID
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID value
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for OwnerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OwnerId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| DomainError::InvalidId(format!("Invalid owner UUID: {e}")))
    }
}

impl From<Uuid> for OwnerId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

// ============================================================================
// LocalId
// ============================================================================

/// Client-generated identifier for a locally created record
///
/// Stable for the record's whole lifetime: it keys the record while offline,
/// correlates the queued INSERT with its result, and travels to the remote
/// store as the idempotency token that deduplicates lost-acknowledgment
/// replays. Generated as `local_<millis>_<random>` so ids sort roughly by
/// creation time and never collide within an owner's scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalId(String);

impl LocalId {
    /// Generate a fresh LocalId from the given creation instant
    #[must_use]
    pub fn generate(now: DateTime<Utc>) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("local_{}_{}", now.timestamp_millis(), &suffix[..8]))
    }

    /// Construct from an existing token string
    pub fn new(token: String) -> Result<Self, DomainError> {
        if token.trim().is_empty() {
            return Err(DomainError::InvalidLocalId(token));
        }
        Ok(Self(token))
    }

    /// The token as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for LocalId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LocalId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for LocalId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

// ============================================================================
// RemoteRowId
// ============================================================================

/// Remote-assigned primary key of a persisted expense row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteRowId(i64);

impl RemoteRowId {
    /// Construct from a raw row id, rejecting non-positive values
    pub fn new(id: i64) -> Result<Self, DomainError> {
        if id <= 0 {
            return Err(DomainError::InvalidRemoteId(id));
        }
        Ok(Self(id))
    }

    /// The raw integer value
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl Display for RemoteRowId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for RemoteRowId {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

// ============================================================================
// Amount
// ============================================================================

/// Non-negative monetary amount
///
/// Stored as a decimal number of currency units. Construction rejects
/// negative and non-finite values, so an `Amount` held by any entity is
/// always valid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(f64);

impl Amount {
    /// Construct a validated amount
    pub fn new(value: f64) -> Result<Self, DomainError> {
        if !value.is_finite() || value < 0.0 {
            return Err(DomainError::InvalidAmount(value.to_string()));
        }
        Ok(Self(value))
    }

    /// Zero amount
    #[must_use]
    pub const fn zero() -> Self {
        Self(0.0)
    }

    /// The raw value
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.0
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl TryFrom<f64> for Amount {
    type Error = DomainError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_id_roundtrip() {
        let id = OwnerId::new();
        let parsed = OwnerId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_owner_id_rejects_garbage() {
        assert!(OwnerId::from_str("not-a-uuid").is_err());
    }

    #[test]
    fn test_local_id_generate_shape() {
        let now = Utc::now();
        let id = LocalId::generate(now);
        assert!(id.as_str().starts_with("local_"));
        assert!(id
            .as_str()
            .contains(&now.timestamp_millis().to_string()));
    }

    #[test]
    fn test_local_id_generate_unique() {
        let now = Utc::now();
        let a = LocalId::generate(now);
        let b = LocalId::generate(now);
        assert_ne!(a, b);
    }

    #[test]
    fn test_local_id_rejects_empty() {
        assert!(LocalId::new("".to_string()).is_err());
        assert!(LocalId::new("   ".to_string()).is_err());
    }

    #[test]
    fn test_remote_row_id_validation() {
        assert!(RemoteRowId::new(1).is_ok());
        assert!(RemoteRowId::new(0).is_err());
        assert!(RemoteRowId::new(-5).is_err());
    }

    #[test]
    fn test_amount_validation() {
        assert!(Amount::new(0.0).is_ok());
        assert!(Amount::new(1500.0).is_ok());
        assert!(Amount::new(-0.01).is_err());
        assert!(Amount::new(f64::NAN).is_err());
        assert!(Amount::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_amount_display() {
        assert_eq!(Amount::new(1500.0).unwrap().to_string(), "1500.00");
        assert_eq!(Amount::new(9.5).unwrap().to_string(), "9.50");
    }
}
