//! Alarm controller.
//!
//! Tracks whether the out-of-service alarm is sounding. Both operations are
//! idempotent; the sounder is only driven on a real change.

use crate::traits::Sounder;
use std::fmt;
use tracing::{debug, error, warn};

/// On/off alarm wrapping a [`Sounder`].
pub struct AlarmController {
    active: bool,
    sounder: Box<dyn Sounder>,
}

impl AlarmController {
    /// Create an inactive alarm driving the given sounder.
    pub fn new(sounder: Box<dyn Sounder>) -> Self {
        Self {
            active: false,
            sounder,
        }
    }

    /// Returns `true` while the alarm is sounding.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Start the alarm.
    ///
    /// # Returns
    ///
    /// Returns `true` if the alarm was off before this call.
    pub fn activate(&mut self) -> bool {
        if self.active {
            debug!("Alarm already active");
            return false;
        }
        self.active = true;
        warn!("Alarm activated");
        if let Err(e) = self.sounder.start_tone() {
            error!(error = %e, "Failed to start alarm tone");
        }
        true
    }

    /// Silence the alarm.
    ///
    /// # Returns
    ///
    /// Returns `true` if the alarm was sounding before this call.
    pub fn deactivate(&mut self) -> bool {
        if !self.active {
            debug!("Alarm already inactive");
            return false;
        }
        self.active = false;
        debug!("Alarm deactivated");
        if let Err(e) = self.sounder.stop_tone() {
            error!(error = %e, "Failed to stop alarm tone");
        }
        true
    }
}

impl fmt::Debug for AlarmController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlarmController")
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSounder;

    #[test]
    fn test_alarm_starts_inactive() {
        let (sounder, _handle) = MockSounder::new();
        let alarm = AlarmController::new(Box::new(sounder));
        assert!(!alarm.is_active());
    }

    #[test]
    fn test_activate_is_idempotent() {
        let (sounder, handle) = MockSounder::new();
        let mut alarm = AlarmController::new(Box::new(sounder));

        assert!(alarm.activate());
        assert!(!alarm.activate());

        assert!(alarm.is_active());
        assert!(handle.is_sounding());
        assert_eq!(handle.start_count(), 1);
    }

    #[test]
    fn test_deactivate_is_idempotent() {
        let (sounder, handle) = MockSounder::new();
        let mut alarm = AlarmController::new(Box::new(sounder));

        assert!(!alarm.deactivate());
        alarm.activate();
        assert!(alarm.deactivate());
        assert!(!alarm.deactivate());

        assert!(!alarm.is_active());
        assert!(!handle.is_sounding());
        assert_eq!(handle.stop_count(), 1);
    }

    #[test]
    fn test_sounder_failure_keeps_state() {
        let (sounder, handle) = MockSounder::new();
        handle.set_failing(true);
        let mut alarm = AlarmController::new(Box::new(sounder));

        assert!(alarm.activate());
        assert!(alarm.is_active());
        assert!(!handle.is_sounding());
    }
}
