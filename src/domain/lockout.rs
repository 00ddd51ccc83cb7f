use chrono::{DateTime, Duration, Utc};

/// Consecutive-failure lockout rule applied to password logins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    pub max_failures: u32,
    pub lock_duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_failures: 5,
            lock_duration: Duration::minutes(30),
        }
    }
}

impl LockoutPolicy {
    #[must_use]
    pub const fn new(max_failures: u32, lock_duration: Duration) -> Self {
        Self {
            max_failures,
            lock_duration,
        }
    }

    /// Returns the lock deadline if it is still in the future.
    #[must_use]
    pub fn active_lock(
        &self,
        locked_until: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        locked_until.filter(|until| *until > now)
    }

    /// Records one failed attempt on top of `attempts`.
    ///
    /// Returns the new counter value and, when the threshold is reached,
    /// the instant the account stays locked until.
    #[must_use]
    pub fn register_failure(
        &self,
        attempts: i32,
        now: DateTime<Utc>,
    ) -> (i32, Option<DateTime<Utc>>) {
        let next = attempts.max(0).saturating_add(1);
        let threshold = i32::try_from(self.max_failures.max(1)).unwrap_or(i32::MAX);
        if next >= threshold {
            let until = now
                .checked_add_signed(self.lock_duration)
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            (next, Some(until))
        } else {
            (next, None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locks_on_fifth_failure() {
        let policy = LockoutPolicy::default();
        let now = Utc::now();

        let mut attempts = 0;
        for _ in 0..4 {
            let (next, lock) = policy.register_failure(attempts, now);
            assert!(lock.is_none());
            attempts = next;
        }
        assert_eq!(attempts, 4);

        let (next, lock) = policy.register_failure(attempts, now);
        assert_eq!(next, 5);
        assert_eq!(lock, Some(now + Duration::minutes(30)));
    }

    #[test]
    fn failures_beyond_threshold_keep_locking() {
        let policy = LockoutPolicy::new(3, Duration::minutes(10));
        let now = Utc::now();
        let (next, lock) = policy.register_failure(7, now);
        assert_eq!(next, 8);
        assert_eq!(lock, Some(now + Duration::minutes(10)));
    }

    #[test]
    fn oversized_lock_duration_saturates() {
        let policy = LockoutPolicy::new(1, Duration::MAX);
        let (next, lock) = policy.register_failure(0, Utc::now());
        assert_eq!(next, 1);
        assert_eq!(lock, Some(DateTime::<Utc>::MAX_UTC));
    }

    #[test]
    fn expired_lock_is_not_active() {
        let policy = LockoutPolicy::default();
        let now = Utc::now();
        assert!(policy.active_lock(None, now).is_none());
        assert!(policy
            .active_lock(Some(now - Duration::seconds(1)), now)
            .is_none());
        assert!(policy.active_lock(Some(now), now).is_none());

        let until = now + Duration::minutes(5);
        assert_eq!(policy.active_lock(Some(until), now), Some(until));
    }
}
