//! Failed-attempt counter and lockout window.
//!
//! All queries take `now` explicitly. Expiry is decided here and nowhere
//! else, so a stale timer can never disagree with a fresh read.

use super::clock::duration_millis;
use std::time::Duration;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LockoutState {
    pub attempt_count: u32,
    /// Epoch millis at which the lockout started, present only once triggered.
    pub lockout_start: Option<i64>,
}

impl LockoutState {
    #[must_use]
    pub fn is_locked_at(&self, now: i64, lockout_duration: Duration) -> bool {
        self.lockout_start
            .is_some_and(|start| now.saturating_sub(start) < duration_millis(lockout_duration))
    }

    /// A lockout that was triggered but whose window has fully elapsed.
    #[must_use]
    pub fn is_expired_at(&self, now: i64, lockout_duration: Duration) -> bool {
        self.lockout_start.is_some() && !self.is_locked_at(now, lockout_duration)
    }

    /// Remaining lockout, never longer than `lockout_duration` even when the
    /// stored start lies in the future.
    #[must_use]
    pub fn remaining_at(&self, now: i64, lockout_duration: Duration) -> Duration {
        let Some(start) = self.lockout_start else {
            return Duration::ZERO;
        };
        let window = duration_millis(lockout_duration);
        let remaining = start
            .saturating_add(window)
            .saturating_sub(now)
            .clamp(0, window);
        Duration::from_millis(u64::try_from(remaining).unwrap_or(0))
    }

    /// Counter as observed at `now`: an expired lockout reads as zero.
    #[must_use]
    pub fn attempts_at(&self, now: i64, lockout_duration: Duration) -> u32 {
        if self.is_expired_at(now, lockout_duration) {
            0
        } else {
            self.attempt_count
        }
    }

    /// Register one failure. Returns true when this failure triggered the lockout.
    pub fn record_failure(&mut self, now: i64, max_attempts: u32) -> bool {
        self.attempt_count = self.attempt_count.saturating_add(1).min(max_attempts);
        if self.attempt_count >= max_attempts {
            self.lockout_start = Some(now);
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(15 * 60);

    #[test]
    fn open_by_default() {
        let state = LockoutState::default();
        assert!(!state.is_locked_at(0, WINDOW));
        assert!(!state.is_expired_at(0, WINDOW));
        assert_eq!(state.remaining_at(0, WINDOW), Duration::ZERO);
    }

    #[test]
    fn failures_lock_at_max() {
        let mut state = LockoutState::default();
        assert!(!state.record_failure(1_000, 3));
        assert!(!state.record_failure(2_000, 3));
        assert_eq!(state.attempt_count, 2);
        assert!(!state.is_locked_at(2_000, WINDOW));

        assert!(state.record_failure(3_000, 3));
        assert_eq!(state.lockout_start, Some(3_000));
        assert!(state.is_locked_at(3_000, WINDOW));
        assert_eq!(state.remaining_at(3_000, WINDOW), WINDOW);
    }

    #[test]
    fn window_boundary_is_exclusive() {
        let state = LockoutState {
            attempt_count: 3,
            lockout_start: Some(0),
        };
        let end = duration_millis(WINDOW);
        assert!(state.is_locked_at(end - 1, WINDOW));
        assert_eq!(state.remaining_at(end - 1, WINDOW), Duration::from_millis(1));
        assert!(!state.is_locked_at(end, WINDOW));
        assert!(state.is_expired_at(end, WINDOW));
        assert_eq!(state.attempts_at(end, WINDOW), 0);
        assert_eq!(state.attempts_at(end - 1, WINDOW), 3);
    }

    #[test]
    fn future_start_is_clamped() {
        let state = LockoutState {
            attempt_count: 3,
            lockout_start: Some(10 * 60 * 1000),
        };
        assert!(state.is_locked_at(0, WINDOW));
        assert_eq!(state.remaining_at(0, WINDOW), WINDOW);
    }
}
