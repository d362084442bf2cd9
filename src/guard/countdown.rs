//! Periodic lockout refresh for interactive front ends.
//!
//! The countdown never changes guard state. Each tick re-reads the remaining
//! lockout from the same pure query the guard uses and publishes it on a
//! `watch` channel. The background task stops when the lockout reaches zero or
//! when the countdown is dropped.

use super::{clock::Clock, lockout::LockoutState};
use std::{sync::Arc, time::Duration};
use tokio::{sync::watch, task::JoinHandle};

pub struct LockoutCountdown {
    remaining: watch::Receiver<Duration>,
    task: JoinHandle<()>,
}

impl LockoutCountdown {
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn start(
        state: LockoutState,
        lockout_duration: Duration,
        clock: Arc<dyn Clock>,
        tick: Duration,
    ) -> Self {
        let initial = state.remaining_at(clock.now_millis(), lockout_duration);
        let (tx, rx) = watch::channel(initial);

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            // first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                let remaining = state.remaining_at(clock.now_millis(), lockout_duration);
                if tx.send(remaining).is_err() || remaining.is_zero() {
                    break;
                }
            }
        });

        Self {
            remaining: rx,
            task,
        }
    }

    #[must_use]
    pub fn remaining(&self) -> Duration {
        *self.remaining.borrow()
    }

    /// Wait for the next published value. Returns `None` once the countdown has finished.
    pub async fn changed(&mut self) -> Option<Duration> {
        self.remaining.changed().await.ok()?;
        Some(*self.remaining.borrow_and_update())
    }
}

impl Drop for LockoutCountdown {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::clock::ManualClock;

    const WINDOW: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn publishes_until_unlocked() {
        let clock = Arc::new(ManualClock::new(0));
        let state = LockoutState {
            attempt_count: 3,
            lockout_start: Some(0),
        };
        let mut countdown = LockoutCountdown::start(
            state,
            WINDOW,
            clock.clone(),
            Duration::from_millis(5),
        );
        assert_eq!(countdown.remaining(), WINDOW);

        clock.advance(Duration::from_secs(30));
        let mut seen = countdown.changed().await;
        while seen == Some(WINDOW) {
            seen = countdown.changed().await;
        }
        assert_eq!(seen, Some(Duration::from_secs(30)));

        clock.advance(Duration::from_secs(31));
        let mut last = seen;
        while let Some(remaining) = countdown.changed().await {
            last = Some(remaining);
        }
        assert_eq!(last, Some(Duration::ZERO));
    }

    #[tokio::test]
    async fn open_state_finishes_at_once() {
        let clock = Arc::new(ManualClock::new(0));
        let mut countdown = LockoutCountdown::start(
            LockoutState::default(),
            WINDOW,
            clock,
            Duration::from_millis(5),
        );
        assert_eq!(countdown.remaining(), Duration::ZERO);
        while countdown.changed().await.is_some() {}
        assert_eq!(countdown.remaining(), Duration::ZERO);
    }

    #[tokio::test]
    async fn drop_cancels_task() {
        let clock = Arc::new(ManualClock::new(0));
        let state = LockoutState {
            attempt_count: 3,
            lockout_start: Some(0),
        };
        let countdown = LockoutCountdown::start(state, WINDOW, clock, Duration::from_secs(3600));
        let mut rx = countdown.remaining.clone();
        drop(countdown);
        // sender is dropped once the aborted task is torn down
        assert!(rx.changed().await.is_err());
    }
}
