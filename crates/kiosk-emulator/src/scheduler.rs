//! One-shot delay queue.
//!
//! The kiosk never blocks: a processing delay or a message hold is an entry
//! in this queue, tagged with the action to run when it comes due. Entries
//! are ordered by deadline, then by insertion, and can be cancelled through
//! the [`TimerHandle`] returned when they were scheduled.

use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

/// Cancellation capability for one scheduled entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle {
    deadline: Instant,
    seq: u64,
}

impl TimerHandle {
    /// When the entry is due.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.seq)
    }
}

/// Deadline-ordered queue of pending actions.
///
/// # Examples
///
/// ```
/// use kiosk_emulator::Scheduler;
/// use std::time::{Duration, Instant};
///
/// let now = Instant::now();
/// let mut scheduler = Scheduler::new();
///
/// scheduler.schedule(now, Duration::from_secs(2), "second");
/// let first = scheduler.schedule(now, Duration::from_secs(1), "first");
/// scheduler.cancel(first);
///
/// assert_eq!(scheduler.pop_due(now + Duration::from_secs(5)), Some((now + Duration::from_secs(2), "second")));
/// assert!(scheduler.is_empty());
/// ```
#[derive(Debug)]
pub struct Scheduler<A> {
    entries: BTreeMap<TimerHandle, A>,
    next_seq: u64,
}

impl<A> Scheduler<A> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// Schedule `action` to run `delay` after `now`.
    pub fn schedule(&mut self, now: Instant, delay: Duration, action: A) -> TimerHandle {
        let handle = TimerHandle {
            deadline: now + delay,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.entries.insert(handle, action);
        handle
    }

    /// Cancel a pending entry.
    ///
    /// # Returns
    ///
    /// Returns the action if it was still pending. Cancelling an entry that
    /// already fired or was cancelled is a no-op returning `None`.
    pub fn cancel(&mut self, handle: TimerHandle) -> Option<A> {
        self.entries.remove(&handle)
    }

    /// Returns `true` if the entry is still pending.
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.entries.contains_key(&handle)
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.keys().next().map(TimerHandle::deadline)
    }

    /// Remove and return the earliest entry if it is due at `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<(Instant, A)> {
        let handle = *self.entries.keys().next()?;
        if handle.deadline > now {
            return None;
        }
        self.entries
            .remove(&handle)
            .map(|action| (handle.deadline, action))
    }

    /// Number of pending entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self::new()
    }
}
