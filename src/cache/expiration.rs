//! TTL arithmetic shared by the local backends.
//!
//! The in-memory store records an absolute expiry at write time, while the file
//! store rebuilds it from the file's modification time. Both go through
//! [`ExpirationPolicy`] so the lazy read path and the sweeper agree on what
//! "stale" means.

use std::time::{Duration, SystemTime};

/// Time-to-live policy for a cache instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExpirationPolicy {
    ttl: Option<Duration>,
}

impl ExpirationPolicy {
    /// A zero `ttl` means entries never expire.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl: (!ttl.is_zero()).then_some(ttl),
        }
    }

    pub fn never() -> Self {
        Self { ttl: None }
    }

    /// Configured TTL, or `None` when entries never expire.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub fn expires(&self) -> bool {
        self.ttl.is_some()
    }

    /// Absolute expiry for an entry written at `written_at`.
    ///
    /// Returns `None` when the policy never expires, or when the expiry instant
    /// cannot be represented by the platform clock.
    pub fn expires_at(&self, written_at: SystemTime) -> Option<SystemTime> {
        self.ttl.and_then(|ttl| written_at.checked_add(ttl))
    }

    /// Staleness test. Reaching the expiry instant exactly is still fresh.
    pub fn is_stale(&self, expires_at: Option<SystemTime>, now: SystemTime) -> bool {
        matches!(expires_at, Some(at) if now > at)
    }

    /// Staleness of an entry whose write time is known rather than its expiry.
    pub fn is_stale_since(&self, written_at: SystemTime, now: SystemTime) -> bool {
        self.is_stale(self.expires_at(written_at), now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_zero_ttl_never_expires() {
        let policy = ExpirationPolicy::new(Duration::ZERO);
        assert_eq!(policy, ExpirationPolicy::never());
        assert!(!policy.expires());

        let written = SystemTime::UNIX_EPOCH;
        assert_eq!(policy.expires_at(written), None);
        assert!(!policy.is_stale_since(written, SystemTime::now()));
    }

    #[test]
    fn test_expiry_boundary_is_fresh() {
        let policy = ExpirationPolicy::new(Duration::from_secs(5));
        let written = SystemTime::UNIX_EPOCH + Duration::from_secs(100);
        let expiry = policy.expires_at(written);

        assert_eq!(expiry, Some(written + Duration::from_secs(5)));
        assert!(!policy.is_stale(expiry, written + Duration::from_secs(5)));
        assert!(policy.is_stale(expiry, written + Duration::from_secs(5) + Duration::from_nanos(1)));
    }

    #[test]
    fn test_overflowing_expiry_is_never() {
        let policy = ExpirationPolicy::new(Duration::MAX);
        assert_eq!(policy.expires_at(SystemTime::now()), None);
        assert!(!policy.is_stale_since(SystemTime::now(), SystemTime::now()));
    }

    proptest! {
        #[test]
        fn property_fresh_within_ttl_window(ttl_ms in 1u64..100_000, elapsed_ms in 0u64..200_000) {
            let policy = ExpirationPolicy::new(Duration::from_millis(ttl_ms));
            let written = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
            let now = written + Duration::from_millis(elapsed_ms);

            prop_assert_eq!(policy.is_stale_since(written, now), elapsed_ms > ttl_ms);
        }

        #[test]
        fn property_recorded_and_derived_expiry_agree(ttl_ms in 0u64..100_000, elapsed_ms in 0u64..200_000) {
            let policy = ExpirationPolicy::new(Duration::from_millis(ttl_ms));
            let written = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
            let now = written + Duration::from_millis(elapsed_ms);

            prop_assert_eq!(
                policy.is_stale(policy.expires_at(written), now),
                policy.is_stale_since(written, now)
            );
        }
    }
}
