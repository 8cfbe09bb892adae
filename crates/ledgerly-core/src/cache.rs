//! Time-bounded value cache
//!
//! A small explicit TTL cache with an injected clock. The remote gateway
//! uses it to memoize the authenticated owner lookup; tests drive expiry
//! deterministically through a manual clock instead of sleeping.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Source of the current instant
///
/// The cache never calls `Utc::now()` itself; the clock is a seam so tests
/// can move time by hand.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock implementation used outside tests
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

struct CacheSlot<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

/// Key-value cache whose entries expire after a fixed time-to-live
///
/// Interior mutability via a `Mutex` so the owning adapter can share it
/// behind `&self`; the lock is held only for map access, never across awaits.
pub struct TtlCache<K, V, C = SystemClock> {
    entries: Mutex<HashMap<K, CacheSlot<V>>>,
    ttl: Duration,
    clock: C,
}

impl<K, V> TtlCache<K, V, SystemClock>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Creates a cache on the system clock
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl<K, V, C> TtlCache<K, V, C>
where
    K: Eq + Hash,
    V: Clone,
    C: Clock,
{
    /// Creates a cache with an explicit clock
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    /// Returns the cached value if present and not expired.
    /// Expired entries are removed on lookup.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            // A poisoned lock means a panic elsewhere; treat as a miss.
            Err(_) => return None,
        };
        match entries.get(key) {
            Some(slot) if slot.expires_at > now => Some(slot.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Inserts or replaces a value, stamped with the current instant plus
    /// the cache's TTL
    pub fn put(&self, key: K, value: V) {
        let expires_at = self.clock.now()
            + chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::zero());
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key, CacheSlot { value, expires_at });
        }
    }

    /// Removes one entry (e.g. on sign-out)
    pub fn invalidate(&self, key: &K) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }

    /// Drops every entry
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Clock the tests advance by hand
    #[derive(Clone)]
    struct ManualClock {
        now: Arc<Mutex<DateTime<Utc>>>,
    }

    impl ManualClock {
        fn new() -> Self {
            Self {
                now: Arc::new(Mutex::new(Utc::now())),
            }
        }

        fn advance(&self, duration: Duration) {
            let mut now = self.now.lock().unwrap();
            *now += chrono::Duration::from_std(duration).unwrap();
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    #[test]
    fn test_hit_before_expiry() {
        let clock = ManualClock::new();
        let cache = TtlCache::with_clock(Duration::from_secs(60), clock.clone());
        cache.put("token", 1u64);
        clock.advance(Duration::from_secs(59));
        assert_eq!(cache.get(&"token"), Some(1));
    }

    #[test]
    fn test_miss_after_expiry() {
        let clock = ManualClock::new();
        let cache = TtlCache::with_clock(Duration::from_secs(60), clock.clone());
        cache.put("token", 1u64);
        clock.advance(Duration::from_secs(61));
        assert_eq!(cache.get(&"token"), None);
    }

    #[test]
    fn test_put_refreshes_expiry() {
        let clock = ManualClock::new();
        let cache = TtlCache::with_clock(Duration::from_secs(60), clock.clone());
        cache.put("token", 1u64);
        clock.advance(Duration::from_secs(45));
        cache.put("token", 2u64);
        clock.advance(Duration::from_secs(45));
        assert_eq!(cache.get(&"token"), Some(2));
    }

    #[test]
    fn test_invalidate_and_clear() {
        let cache: TtlCache<&str, u64> = TtlCache::new(Duration::from_secs(60));
        cache.put("a", 1);
        cache.put("b", 2);
        cache.invalidate(&"a");
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"b"), Some(2));
        cache.clear();
        assert_eq!(cache.get(&"b"), None);
    }
}
