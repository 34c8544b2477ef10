//! Cancelable one-second countdown.
//!
//! A [`CountdownTimer`] counts whole seconds down to zero. It does not own a
//! thread or a task: the owner asks for [`next_wake`](CountdownTimer::next_wake)
//! and calls [`fire_due`](CountdownTimer::fire_due) once time has reached it.
//! Each firing yields one [`CountdownEvent`].
//!
//! The timer holds at most one pending wake-up. Starting it again replaces
//! the previous run, so two expiries can never be pending for one timer.
//!
//! # Examples
//!
//! ```
//! use kiosk_emulator::{CountdownEvent, CountdownTimer};
//! use std::time::{Duration, Instant};
//!
//! let start = Instant::now();
//! let mut timer = CountdownTimer::new();
//!
//! assert_eq!(timer.start(2, start), CountdownEvent::Tick(2));
//! assert_eq!(timer.fire_due(start + Duration::from_secs(1)), Some(CountdownEvent::Tick(1)));
//! assert_eq!(timer.fire_due(start + Duration::from_secs(2)), Some(CountdownEvent::Expired));
//! assert_eq!(timer.fire_due(start + Duration::from_secs(9)), None);
//! ```

use std::time::{Duration, Instant};

const TICK: Duration = Duration::from_secs(1);

/// Notification produced by a countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEvent {
    /// Seconds left. Emitted on start and after every elapsed second above zero.
    Tick(u32),
    /// The countdown reached zero. Emitted exactly once per run.
    Expired,
}

/// Whole-second countdown with explicit polling.
#[derive(Debug, Clone, Default)]
pub struct CountdownTimer {
    total_secs: u32,
    remaining_secs: u32,
    next_wake: Option<Instant>,
}

impl CountdownTimer {
    /// Create a stopped timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting down from `seconds`, cancelling any run in progress.
    ///
    /// # Returns
    ///
    /// Returns the initial `Tick(seconds)`. A zero-length countdown expires
    /// on the first poll.
    pub fn start(&mut self, seconds: u32, now: Instant) -> CountdownEvent {
        self.total_secs = seconds;
        self.remaining_secs = seconds;
        self.next_wake = Some(if seconds == 0 { now } else { now + TICK });
        CountdownEvent::Tick(seconds)
    }

    /// Stop the countdown. Does nothing if it is not running.
    ///
    /// # Returns
    ///
    /// Returns `true` if a run was cancelled.
    pub fn cancel(&mut self) -> bool {
        self.next_wake.take().is_some()
    }

    /// Alias of [`cancel`](Self::cancel).
    pub fn reset(&mut self) -> bool {
        self.cancel()
    }

    /// Returns `true` while a run is in progress.
    pub fn is_running(&self) -> bool {
        self.next_wake.is_some()
    }

    /// Seconds left in the current (or last) run.
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    /// Length of the current (or last) run.
    pub fn total_secs(&self) -> u32 {
        self.total_secs
    }

    /// When the next event is due, if running.
    pub fn next_wake(&self) -> Option<Instant> {
        self.next_wake
    }

    /// Fire the pending wake-up if it is due at `now`.
    ///
    /// Only one step is taken per call; an owner that fell behind calls this
    /// in a loop until it returns `None`.
    pub fn fire_due(&mut self, now: Instant) -> Option<CountdownEvent> {
        let wake = self.next_wake.filter(|wake| *wake <= now)?;

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.next_wake = None;
            return Some(CountdownEvent::Expired);
        }

        self.next_wake = Some(wake + TICK);
        Some(CountdownEvent::Tick(self.remaining_secs))
    }
}
