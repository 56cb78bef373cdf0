//! Client-side attempt limiting for OTP submission. Whether the backend
//! enforces its own lockout is unknown, so the client refuses to keep
//! submitting after repeated failures: the limiter is consulted before any
//! request is sent, and a cool-down must elapse before the next attempt.
//! Failure stays non-terminal: once the window passes, the user may retry.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// What an OTP challenge authorizes once verified.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OtpPurpose {
    Registration,
    PasswordReset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttemptDecision {
    Allowed,
    Limited { retry_after_secs: u64 },
}

/// Attempt policy consulted before each OTP submission. Embedders can swap in
/// [`NoopLimiter`] or their own policy.
pub trait OtpLimiter: Send + Sync {
    fn check(&self, email: &str, purpose: OtpPurpose) -> AttemptDecision;
    fn record_failure(&self, email: &str, purpose: OtpPurpose);
    fn record_success(&self, email: &str, purpose: OtpPurpose);
}

/// Limiter that allows everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopLimiter;

impl OtpLimiter for NoopLimiter {
    fn check(&self, _email: &str, _purpose: OtpPurpose) -> AttemptDecision {
        AttemptDecision::Allowed
    }

    fn record_failure(&self, _email: &str, _purpose: OtpPurpose) {}

    fn record_success(&self, _email: &str, _purpose: OtpPurpose) {}
}

/// Default policy: after `max_failures` consecutive failures for one
/// (email, purpose) pair, submissions are refused until `cooldown` has passed
/// since the last failure. A success clears the window.
#[derive(Debug)]
pub struct WindowedLimiter {
    max_failures: u32,
    cooldown: Duration,
    state: Mutex<HashMap<(String, OtpPurpose), Window>>,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    failures: u32,
    last_failure: Instant,
}

impl WindowedLimiter {
    pub const DEFAULT_MAX_FAILURES: u32 = 5;
    pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

    pub fn new(max_failures: u32, cooldown: Duration) -> Self {
        Self {
            max_failures: max_failures.max(1),
            cooldown,
            state: Mutex::new(HashMap::new()),
        }
    }

    fn check_at(&self, email: &str, purpose: OtpPurpose, now: Instant) -> AttemptDecision {
        let mut state = self.lock();
        let key = (email.to_string(), purpose);

        let Some(window) = state.get(&key).copied() else {
            return AttemptDecision::Allowed;
        };

        if window.failures < self.max_failures {
            return AttemptDecision::Allowed;
        }

        let elapsed = now.saturating_duration_since(window.last_failure);
        if elapsed >= self.cooldown {
            state.remove(&key);
            AttemptDecision::Allowed
        } else {
            let remaining = self.cooldown - elapsed;
            AttemptDecision::Limited {
                retry_after_secs: remaining.as_secs().max(1),
            }
        }
    }

    fn record_failure_at(&self, email: &str, purpose: OtpPurpose, now: Instant) {
        let mut state = self.lock();
        let window = state
            .entry((email.to_string(), purpose))
            .or_insert(Window {
                failures: 0,
                last_failure: now,
            });
        window.failures = window.failures.saturating_add(1);
        window.last_failure = now;
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<(String, OtpPurpose), Window>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for WindowedLimiter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_FAILURES, Self::DEFAULT_COOLDOWN)
    }
}

impl OtpLimiter for WindowedLimiter {
    fn check(&self, email: &str, purpose: OtpPurpose) -> AttemptDecision {
        self.check_at(email, purpose, Instant::now())
    }

    fn record_failure(&self, email: &str, purpose: OtpPurpose) {
        self.record_failure_at(email, purpose, Instant::now());
    }

    fn record_success(&self, email: &str, purpose: OtpPurpose) {
        self.lock().remove(&(email.to_string(), purpose));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMAIL: &str = "a@x.com";

    fn limited(decision: AttemptDecision) -> bool {
        matches!(decision, AttemptDecision::Limited { .. })
    }

    #[test]
    fn noop_limiter_always_allows() {
        let limiter = NoopLimiter;
        limiter.record_failure(EMAIL, OtpPurpose::Registration);
        assert_eq!(
            limiter.check(EMAIL, OtpPurpose::Registration),
            AttemptDecision::Allowed
        );
    }

    #[test]
    fn allows_until_max_failures() {
        let limiter = WindowedLimiter::new(3, Duration::from_secs(60));
        let now = Instant::now();

        for _ in 0..2 {
            limiter.record_failure_at(EMAIL, OtpPurpose::Registration, now);
        }
        assert_eq!(
            limiter.check_at(EMAIL, OtpPurpose::Registration, now),
            AttemptDecision::Allowed
        );

        limiter.record_failure_at(EMAIL, OtpPurpose::Registration, now);
        assert!(limited(limiter.check_at(EMAIL, OtpPurpose::Registration, now)));
    }

    #[test]
    fn cooldown_reopens_the_window() {
        let limiter = WindowedLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();

        limiter.record_failure_at(EMAIL, OtpPurpose::PasswordReset, now);
        assert!(limited(limiter.check_at(EMAIL, OtpPurpose::PasswordReset, now)));

        let later = now + Duration::from_secs(61);
        assert_eq!(
            limiter.check_at(EMAIL, OtpPurpose::PasswordReset, later),
            AttemptDecision::Allowed
        );
        // The expired window is dropped, so the next failure starts fresh.
        assert_eq!(
            limiter.check_at(EMAIL, OtpPurpose::PasswordReset, now),
            AttemptDecision::Allowed
        );
    }

    #[test]
    fn retry_after_counts_down() {
        let limiter = WindowedLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();
        limiter.record_failure_at(EMAIL, OtpPurpose::Registration, now);

        let at_start = limiter.check_at(EMAIL, OtpPurpose::Registration, now);
        assert_eq!(
            at_start,
            AttemptDecision::Limited {
                retry_after_secs: 60
            }
        );

        let halfway = limiter.check_at(EMAIL, OtpPurpose::Registration, now + Duration::from_secs(30));
        assert_eq!(
            halfway,
            AttemptDecision::Limited {
                retry_after_secs: 30
            }
        );
    }

    #[test]
    fn success_clears_the_window() {
        let limiter = WindowedLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();

        limiter.record_failure_at(EMAIL, OtpPurpose::Registration, now);
        limiter.record_success(EMAIL, OtpPurpose::Registration);
        assert_eq!(
            limiter.check_at(EMAIL, OtpPurpose::Registration, now),
            AttemptDecision::Allowed
        );
    }

    #[test]
    fn purposes_are_limited_independently() {
        let limiter = WindowedLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();

        limiter.record_failure_at(EMAIL, OtpPurpose::Registration, now);
        assert!(limited(limiter.check_at(EMAIL, OtpPurpose::Registration, now)));
        assert_eq!(
            limiter.check_at(EMAIL, OtpPurpose::PasswordReset, now),
            AttemptDecision::Allowed
        );
        assert_eq!(
            limiter.check_at("b@x.com", OtpPurpose::Registration, now),
            AttemptDecision::Allowed
        );
    }
}
