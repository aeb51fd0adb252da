// ── Sliding-window rate limiter ──
//
// Attempts are kept per key as an ordered list of timestamps. Every check
// prunes the list to the current window before counting, so the window
// slides with the clock instead of resetting on fixed boundaries.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use tracing::trace;

use crate::clock::{Clock, SystemClock};

/// How many attempts a key may make within a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_attempts: u32,
    pub window: Duration,
}

impl RateLimitPolicy {
    /// General-purpose limit: 5 attempts per minute.
    pub const DEFAULT: Self = Self {
        max_attempts: 5,
        window: Duration::from_secs(60),
    };

    /// Payment form submissions: 10 per minute.
    pub const FORM_SUBMISSION: Self = Self {
        max_attempts: 10,
        window: Duration::from_secs(60),
    };

    pub const fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
        }
    }

    fn window_delta(&self) -> TimeDelta {
        TimeDelta::from_std(self.window).unwrap_or(TimeDelta::MAX)
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Storage for per-key attempt timestamps.
///
/// Injected into [`RateLimiter`] so the backing map can be swapped (or
/// inspected in tests). Lists are stored oldest first.
pub trait RateLimitStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Vec<DateTime<Utc>>>;
    fn set(&self, key: &str, attempts: Vec<DateTime<Utc>>);
    fn remove(&self, key: &str);
    fn keys(&self) -> Vec<String>;
}

/// Process-local store backed by a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Vec<DateTime<Utc>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RateLimitStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Vec<DateTime<Utc>>> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn set(&self, key: &str, attempts: Vec<DateTime<Utc>>) {
        self.entries.insert(key.to_owned(), attempts);
    }

    fn remove(&self, key: &str) {
        self.entries.remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }
}

/// Point-in-time view of a key's budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    /// Attempts recorded inside the current window.
    pub attempts: u32,
    pub max_attempts: u32,
    /// When the newest recorded attempt leaves the window (or `now` if
    /// there are none).
    pub reset_at: DateTime<Utc>,
}

impl RateLimitStatus {
    pub fn remaining(&self) -> u32 {
        self.max_attempts.saturating_sub(self.attempts)
    }
}

/// Sliding-window limiter over an injected store and clock.
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    clock: Arc<dyn Clock>,
    // Serializes read-prune-write so concurrent checks on one key cannot
    // both see the last free slot.
    write_lock: Mutex<()>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            write_lock: Mutex::new(()),
        }
    }

    /// In-memory store on the wall clock.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(SystemClock))
    }

    /// Record an attempt for `key` if the policy allows it.
    ///
    /// Returns `false` without recording anything when the window is full.
    pub fn check(&self, key: &str, policy: RateLimitPolicy) -> bool {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let now = self.clock.now();
        let mut attempts = self.recent(key, now, policy);

        if attempts.len() >= usize::try_from(policy.max_attempts).unwrap_or(usize::MAX) {
            trace!(key, attempts = attempts.len(), "rate limit reached");
            return false;
        }

        attempts.push(now);
        self.store.set(key, attempts);
        true
    }

    /// Inspect `key` without recording an attempt.
    pub fn status(&self, key: &str, policy: RateLimitPolicy) -> RateLimitStatus {
        let now = self.clock.now();
        let attempts = self.recent(key, now, policy);

        let reset_at = attempts
            .iter()
            .max()
            .map_or(now, |newest| {
                newest
                    .checked_add_signed(policy.window_delta())
                    .unwrap_or(DateTime::<Utc>::MAX_UTC)
            });

        RateLimitStatus {
            attempts: u32::try_from(attempts.len()).unwrap_or(u32::MAX),
            max_attempts: policy.max_attempts,
            reset_at,
        }
    }

    /// Drop keys whose newest attempt is older than `idle_for`.
    ///
    /// Returns how many keys were removed.
    pub fn evict_idle(&self, idle_for: Duration) -> usize {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let idle_for = TimeDelta::from_std(idle_for).unwrap_or(TimeDelta::MAX);
        let cutoff = saturating_sub(self.clock.now(), idle_for);
        let mut evicted = 0;

        for key in self.store.keys() {
            let stale = self
                .store
                .get(&key)
                .is_none_or(|attempts| attempts.iter().all(|ts| *ts <= cutoff));
            if stale {
                self.store.remove(&key);
                evicted += 1;
            }
        }

        if evicted > 0 {
            trace!(evicted, "evicted idle rate-limit keys");
        }
        evicted
    }

    /// Forget every key.
    pub fn clear(&self) {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        for key in self.store.keys() {
            self.store.remove(&key);
        }
    }

    fn recent(&self, key: &str, now: DateTime<Utc>, policy: RateLimitPolicy) -> Vec<DateTime<Utc>> {
        let window_start = saturating_sub(now, policy.window_delta());
        let mut attempts = self.store.get(key).unwrap_or_default();
        attempts.retain(|ts| *ts > window_start);
        attempts
    }
}

fn saturating_sub(at: DateTime<Utc>, delta: TimeDelta) -> DateTime<Utc> {
    at.checked_sub_signed(delta).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn limiter() -> (RateLimiter, Arc<ManualClock>, Arc<MemoryStore>) {
        let clock = Arc::new(ManualClock::new(
            DateTime::parse_from_rfc3339("2026-10-16T08:00:00Z")
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_default(),
        ));
        let store = Arc::new(MemoryStore::new());
        let limiter = RateLimiter::new(store.clone(), clock.clone());
        (limiter, clock, store)
    }

    #[test]
    fn allows_exactly_max_attempts_within_window() {
        let (limiter, clock, _) = limiter();
        let policy = RateLimitPolicy::DEFAULT;

        for _ in 0..policy.max_attempts {
            assert!(limiter.check("user@g.cjc.edu.ph", policy));
            clock.advance(TimeDelta::seconds(1));
        }
        assert!(!limiter.check("user@g.cjc.edu.ph", policy));
    }

    #[test]
    fn window_slides_past_first_attempt() {
        let (limiter, clock, _) = limiter();
        let policy = RateLimitPolicy::new(3, Duration::from_secs(60));
        let first = clock.now();

        for _ in 0..3 {
            assert!(limiter.check("k", policy));
        }
        assert!(!limiter.check("k", policy));

        clock.set(first + TimeDelta::milliseconds(60_001));
        assert!(limiter.check("k", policy));
    }

    #[test]
    fn rejected_attempt_is_not_recorded() {
        let (limiter, clock, store) = limiter();
        let policy = RateLimitPolicy::new(2, Duration::from_secs(60));

        assert!(limiter.check("k", policy));
        clock.advance(TimeDelta::seconds(30));
        assert!(limiter.check("k", policy));
        assert!(!limiter.check("k", policy));
        assert_eq!(store.get("k").map(|v| v.len()), Some(2));

        // Only the first attempt leaves the window, freeing one slot.
        clock.advance(TimeDelta::seconds(31));
        assert!(limiter.check("k", policy));
        assert!(!limiter.check("k", policy));
    }

    #[test]
    fn keys_are_independent() {
        let (limiter, _, _) = limiter();
        let policy = RateLimitPolicy::new(1, Duration::from_secs(60));

        assert!(limiter.check("a", policy));
        assert!(!limiter.check("a", policy));
        assert!(limiter.check("b", policy));
    }

    #[test]
    fn form_submission_policy_allows_ten() {
        let (limiter, _, _) = limiter();
        let policy = RateLimitPolicy::FORM_SUBMISSION;

        for _ in 0..10 {
            assert!(limiter.check("form_submission_x", policy));
        }
        assert!(!limiter.check("form_submission_x", policy));
    }

    #[test]
    fn status_reports_usage_and_reset() {
        let (limiter, clock, _) = limiter();
        let policy = RateLimitPolicy::DEFAULT;
        let start = clock.now();

        let status = limiter.status("k", policy);
        assert_eq!(status.attempts, 0);
        assert_eq!(status.reset_at, start);

        limiter.check("k", policy);
        clock.advance(TimeDelta::seconds(10));
        limiter.check("k", policy);

        let status = limiter.status("k", policy);
        assert_eq!(status.attempts, 2);
        assert_eq!(status.max_attempts, 5);
        assert_eq!(status.remaining(), 3);
        assert_eq!(status.reset_at, start + TimeDelta::seconds(70));
    }

    #[test]
    fn evict_idle_drops_stale_keys_only() {
        let (limiter, clock, store) = limiter();
        let policy = RateLimitPolicy::DEFAULT;

        limiter.check("old", policy);
        clock.advance(TimeDelta::minutes(20));
        limiter.check("fresh", policy);
        clock.advance(TimeDelta::minutes(1));

        assert_eq!(limiter.evict_idle(Duration::from_secs(10 * 60)), 1);
        assert!(store.get("old").is_none());
        assert!(store.get("fresh").is_some());
    }

    #[test]
    fn clear_forgets_everything() {
        let (limiter, _, store) = limiter();
        let policy = RateLimitPolicy::new(1, Duration::from_secs(60));

        limiter.check("a", policy);
        limiter.check("b", policy);
        limiter.clear();

        assert!(store.is_empty());
        assert!(limiter.check("a", policy));
    }
}
