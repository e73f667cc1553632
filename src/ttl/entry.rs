//! Timed Entry Module
//!
//! A memoized value together with the instant it stops being valid.

use std::time::Duration;

use tokio::time::Instant;

// == Timed Entry ==
/// Represents a single in-memory memoized result.
#[derive(Debug, Clone)]
pub struct TimedEntry<V> {
    /// The memoized value
    pub value: V,
    /// When the value was computed
    pub created_at: Instant,
    /// When the value expires
    pub expires_at: Instant,
}

impl<V> TimedEntry<V> {
    // == Constructor ==
    /// Creates an entry that lives for `ttl` from now.
    pub fn new(value: V, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            value,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current instant reaches `expires_at`, so
    /// a zero TTL never serves a cached value.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    // == Time To Live ==
    /// Remaining lifetime, zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}
