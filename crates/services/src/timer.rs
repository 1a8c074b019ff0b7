//! Wall-clock driver for [`Countdown`].

use std::time::Duration;

use exam_core::countdown::{Countdown, Tick, is_urgent};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};

use crate::error::TimerError;

/// Latest published state of a running countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerSnapshot {
    pub remaining_secs: u32,
    pub expired: bool,
}

impl TimerSnapshot {
    #[must_use]
    pub fn is_urgent(&self) -> bool {
        is_urgent(self.remaining_secs)
    }
}

/// A countdown ticking once per period on the tokio runtime.
///
/// Expiry is published exactly once through the watch channel, after which
/// the background task ends. Disposing (or dropping) the timer aborts the
/// task; disposing twice is a no-op.
#[derive(Debug)]
pub struct CountdownTimer {
    state: watch::Receiver<TimerSnapshot>,
    task: Option<JoinHandle<()>>,
}

impl CountdownTimer {
    /// Start a countdown of `duration_secs` ticking every second.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::NoRuntime` outside a tokio runtime.
    pub fn start(duration_secs: u32) -> Result<Self, TimerError> {
        Self::start_with_period(duration_secs, Duration::from_secs(1))
    }

    /// Start a countdown with a custom tick period.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::NoRuntime` outside a tokio runtime.
    pub fn start_with_period(duration_secs: u32, period: Duration) -> Result<Self, TimerError> {
        let handle = Handle::try_current().map_err(|_| TimerError::NoRuntime)?;
        let (tx, rx) = watch::channel(TimerSnapshot {
            remaining_secs: duration_secs,
            expired: false,
        });

        let task = handle.spawn(async move {
            let mut countdown = Countdown::new(duration_secs);
            let mut ticks = interval_at(Instant::now() + period, period);
            loop {
                ticks.tick().await;
                let snapshot = match countdown.tick() {
                    Tick::Running { remaining_secs } => TimerSnapshot {
                        remaining_secs,
                        expired: false,
                    },
                    Tick::Expired => TimerSnapshot {
                        remaining_secs: 0,
                        expired: true,
                    },
                    Tick::Stopped => break,
                };
                // No receivers left means nobody is watching any more.
                if tx.send(snapshot).is_err() || snapshot.expired {
                    break;
                }
            }
        });

        Ok(Self {
            state: rx,
            task: Some(task),
        })
    }

    #[must_use]
    pub fn snapshot(&self) -> TimerSnapshot {
        *self.state.borrow()
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.snapshot().remaining_secs
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.snapshot().expired
    }

    /// Ticking and not yet disposed.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.is_some() && !self.is_expired()
    }

    /// Another receiver of the published state, for waiting outside the owner.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.state.clone()
    }

    /// Stop ticking. No expiry is published afterwards.
    pub fn dispose(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Wait until the watched countdown expires.
///
/// Returns `false` if the timer is disposed first.
pub async fn wait_for_expiry(mut state: watch::Receiver<TimerSnapshot>) -> bool {
    loop {
        if state.borrow_and_update().expired {
            return true;
        }
        if state.changed().await.is_err() {
            return state.borrow().expired;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn counts_down_and_expires_once() {
        let timer = CountdownTimer::start(3).unwrap();
        let mut rx = timer.subscribe();
        assert_eq!(timer.remaining_secs(), 3);
        assert!(timer.is_running());

        let mut seen = Vec::new();
        while rx.changed().await.is_ok() {
            seen.push(*rx.borrow_and_update());
        }

        assert_eq!(
            seen.iter().map(|s| s.remaining_secs).collect::<Vec<_>>(),
            vec![2, 1, 0]
        );
        assert_eq!(seen.iter().filter(|s| s.expired).count(), 1);
        assert!(timer.is_expired());
        assert!(!timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn dispose_suppresses_expiry() {
        let mut timer = CountdownTimer::start(5).unwrap();
        let rx = timer.subscribe();

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(timer.remaining_secs(), 3);

        timer.dispose();
        timer.dispose();
        assert!(!timer.is_running());

        assert!(!wait_for_expiry(rx).await);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!timer.is_expired());
        assert_eq!(timer.remaining_secs(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_for_expiry_resolves_at_deadline() {
        let timer = CountdownTimer::start(2).unwrap();
        let started = Instant::now();
        assert!(wait_for_expiry(timer.subscribe()).await);
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[test]
    fn start_without_runtime_fails() {
        let err = CountdownTimer::start(10).unwrap_err();
        assert!(matches!(err, TimerError::NoRuntime));
    }

    #[test]
    fn urgency_tracks_remaining_time() {
        let snapshot = TimerSnapshot {
            remaining_secs: 59,
            expired: false,
        };
        assert!(snapshot.is_urgent());
    }
}
