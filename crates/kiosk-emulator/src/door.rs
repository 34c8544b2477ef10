//! Gate door controller.
//!
//! Tracks whether the gate is open, since when and why, and owns the single
//! pending auto-close entry in the kiosk's [`Scheduler`]. The physical gate
//! is driven through a [`DoorPanel`]; actuator failures are logged and do
//! not change the tracked state.

use std::fmt;
use std::time::{Duration, Instant};

use kiosk_core::OpenReason;
use kiosk_hardware::DoorPanel;
use tracing::{debug, error, info};

use crate::scheduler::{Scheduler, TimerHandle};

/// Open/closed gate with auto-close bookkeeping.
///
/// Invariant: `opened_at` is `Some` iff the door is open.
pub struct DoorController {
    panel: Box<dyn DoorPanel>,
    opened_at: Option<Instant>,
    reason: Option<OpenReason>,
    auto_close: Option<TimerHandle>,
}

impl DoorController {
    /// Create a closed door driving the given panel.
    pub fn new(panel: Box<dyn DoorPanel>) -> Self {
        Self {
            panel,
            opened_at: None,
            reason: None,
            auto_close: None,
        }
    }

    /// Returns `true` while the gate is open.
    pub fn is_open(&self) -> bool {
        self.opened_at.is_some()
    }

    /// When the gate was opened, if open.
    pub fn opened_at(&self) -> Option<Instant> {
        self.opened_at
    }

    /// Why the gate was opened, if open.
    pub fn open_reason(&self) -> Option<OpenReason> {
        self.reason
    }

    /// How long the gate has been open as of `now`.
    pub fn elapsed_open(&self, now: Instant) -> Option<Duration> {
        self.opened_at
            .map(|opened| now.saturating_duration_since(opened))
    }

    /// The pending auto-close entry, if any.
    pub fn auto_close_handle(&self) -> Option<TimerHandle> {
        self.auto_close
    }

    /// Open the gate. Opening an open gate is a no-op.
    ///
    /// # Returns
    ///
    /// Returns `true` if the gate was closed before this call.
    pub fn open(&mut self, reason: OpenReason, now: Instant) -> bool {
        if self.is_open() {
            debug!(reason = %reason, "Door already open");
            return false;
        }

        self.opened_at = Some(now);
        self.reason = Some(reason);
        info!(reason = %reason, "Door opened");

        if let Err(e) = self.panel.open(reason) {
            error!(error = %e, "Door actuator failed to open");
        }
        true
    }

    /// Schedule `action` to close the gate after `delay`, replacing any
    /// previously scheduled auto-close.
    pub fn schedule_auto_close<A>(
        &mut self,
        scheduler: &mut Scheduler<A>,
        now: Instant,
        delay: Duration,
        action: A,
    ) -> TimerHandle {
        self.cancel_auto_close(scheduler);
        let handle = scheduler.schedule(now, delay, action);
        debug!(delay_ms = delay.as_millis() as u64, timer = %handle, "Door auto-close scheduled");
        self.auto_close = Some(handle);
        handle
    }

    /// Cancel the pending auto-close, if any.
    ///
    /// # Returns
    ///
    /// Returns `true` if an auto-close was still pending.
    pub fn cancel_auto_close<A>(&mut self, scheduler: &mut Scheduler<A>) -> bool {
        self.auto_close
            .take()
            .is_some_and(|handle| scheduler.cancel(handle).is_some())
    }

    /// Close the gate when its auto-close fires.
    ///
    /// # Returns
    ///
    /// Returns how long the gate was open, or `None` if it was already closed.
    pub fn close(&mut self, now: Instant) -> Option<Duration> {
        self.auto_close = None;
        let open_for = self.elapsed_open(now)?;
        let reason = self.reason.take();
        self.opened_at = None;

        info!(
            open_ms = open_for.as_millis() as u64,
            reason = reason.map(OpenReason::as_str),
            "Door closed"
        );

        if let Err(e) = self.panel.close() {
            error!(error = %e, "Door actuator failed to close");
        }
        Some(open_for)
    }

    /// Close the gate because the visitor went through, cancelling the
    /// pending auto-close.
    ///
    /// # Returns
    ///
    /// Returns how long the gate was open, or `None` if it was already closed.
    pub fn close_manual<A>(
        &mut self,
        scheduler: &mut Scheduler<A>,
        now: Instant,
    ) -> Option<Duration> {
        if !self.is_open() {
            debug!("Manual close ignored: door already closed");
            return None;
        }

        let cancelled = self.cancel_auto_close(scheduler);
        let open_for = self.elapsed_open(now).unwrap_or_default();
        info!(
            open_secs = open_for.as_secs_f64(),
            reason = self.reason.map(OpenReason::as_str),
            auto_close_cancelled = cancelled,
            "Door closed manually"
        );
        self.close(now)
    }
}

impl fmt::Debug for DoorController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DoorController")
            .field("opened_at", &self.opened_at)
            .field("reason", &self.reason)
            .field("auto_close", &self.auto_close)
            .finish_non_exhaustive()
    }
}
