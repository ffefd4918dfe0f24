//! Time source for the scheduler.
//!
//! [`SystemClock`] sleeps on the wall clock. [`ManualClock`] keeps virtual
//! time so playback can be tested deterministically without real sleeps.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use super::cancel::CancelToken;

/// Longest single sleep slice while waiting on a cancellable beat.
const CANCEL_POLL: Duration = Duration::from_millis(5);

pub trait Clock: Send {
    /// Time elapsed since the clock was created.
    fn now(&self) -> Duration;

    /// Block for `duration`.
    fn sleep(&self, duration: Duration);

    /// Block for up to `duration`, returning early once `cancel` is set.
    fn sleep_unless_cancelled(&self, duration: Duration, cancel: &CancelToken) {
        if !cancel.is_cancelled() {
            self.sleep(duration);
        }
    }
}

/// Wall-clock time.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }

    fn sleep_unless_cancelled(&self, duration: Duration, cancel: &CancelToken) {
        let deadline = Instant::now() + duration;
        while !cancel.is_cancelled() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            thread::sleep(remaining.min(CANCEL_POLL));
        }
    }
}

#[derive(Debug, Default)]
struct ManualState {
    now: Duration,
    sleeps: Vec<Duration>,
}

/// Virtual time: every sleep advances `now` instantly and is recorded.
///
/// Clones share the same timeline, so a test can keep one handle while the
/// scheduler owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    state: Arc<Mutex<ManualState>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every sleep taken so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.lock().sleeps.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.lock().now
    }

    fn sleep(&self, duration: Duration) {
        let mut state = self.lock();
        state.now += duration;
        state.sleeps.push(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances_on_sleep() {
        let clock = ManualClock::new();
        clock.sleep(Duration::from_millis(250));
        clock.sleep(Duration::from_millis(250));
        assert_eq!(clock.now(), Duration::from_millis(500));
        assert_eq!(clock.sleeps().len(), 2);
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        clock.sleep(Duration::from_millis(10));
        assert_eq!(handle.now(), Duration::from_millis(10));
    }

    #[test]
    fn cancelled_sleep_is_skipped() {
        let clock = ManualClock::new();
        let cancel = CancelToken::new();
        cancel.cancel();
        clock.sleep_unless_cancelled(Duration::from_secs(1), &cancel);
        assert_eq!(clock.now(), Duration::ZERO);
    }

    #[test]
    fn system_clock_wakes_early_on_cancel() {
        let clock = SystemClock::new();
        let cancel = CancelToken::new();
        let remote = cancel.clone();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            remote.cancel();
        });
        let started = Instant::now();
        clock.sleep_unless_cancelled(Duration::from_secs(10), &cancel);
        canceller.join().unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn system_clock_sleeps_full_duration() {
        let clock = SystemClock::new();
        let started = Instant::now();
        clock.sleep_unless_cancelled(Duration::from_millis(15), &CancelToken::new());
        assert!(started.elapsed() >= Duration::from_millis(15));
    }
}
