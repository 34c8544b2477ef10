//! Mock gate actuator.

use crate::{HardwareError, Result, traits::DoorPanel};
use kiosk_core::OpenReason;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct DoorLog {
    open: bool,
    opens: Vec<OpenReason>,
    closes: usize,
    failing: bool,
}

/// Gate actuator that records commands.
///
/// # Examples
///
/// ```
/// use kiosk_hardware::mock::MockDoorPanel;
/// use kiosk_hardware::traits::DoorPanel;
/// use kiosk_core::OpenReason;
///
/// let (mut door, handle) = MockDoorPanel::new();
/// door.open(OpenReason::Qr).unwrap();
///
/// assert!(handle.is_open());
/// assert_eq!(handle.open_reasons(), vec![OpenReason::Qr]);
/// ```
#[derive(Debug)]
pub struct MockDoorPanel {
    log: Arc<Mutex<DoorLog>>,
}

impl MockDoorPanel {
    /// Create a door panel and the handle that observes it.
    pub fn new() -> (Self, MockDoorPanelHandle) {
        let log = Arc::new(Mutex::new(DoorLog::default()));
        let handle = MockDoorPanelHandle {
            log: Arc::clone(&log),
        };
        (Self { log }, handle)
    }
}

impl DoorPanel for MockDoorPanel {
    fn open(&mut self, reason: OpenReason) -> Result<()> {
        let mut log = lock(&self.log);
        if log.failing {
            return Err(HardwareError::actuator("gate motor not responding"));
        }
        log.open = true;
        log.opens.push(reason);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let mut log = lock(&self.log);
        if log.failing {
            return Err(HardwareError::actuator("gate motor not responding"));
        }
        log.open = false;
        log.closes += 1;
        Ok(())
    }
}

/// Handle for inspecting a [`MockDoorPanel`].
#[derive(Debug, Clone)]
pub struct MockDoorPanelHandle {
    log: Arc<Mutex<DoorLog>>,
}

impl MockDoorPanelHandle {
    /// Returns `true` if the last command was an open.
    pub fn is_open(&self) -> bool {
        lock(&self.log).open
    }

    /// Reasons of every open command, oldest first.
    pub fn open_reasons(&self) -> Vec<OpenReason> {
        lock(&self.log).opens.clone()
    }

    /// Number of close commands received.
    pub fn close_count(&self) -> usize {
        lock(&self.log).closes
    }

    /// Make every following command fail.
    pub fn set_failing(&self, failing: bool) {
        lock(&self.log).failing = failing;
    }
}

fn lock(log: &Mutex<DoorLog>) -> MutexGuard<'_, DoorLog> {
    log.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_and_close() {
        let (mut door, handle) = MockDoorPanel::new();

        door.open(OpenReason::Coins).unwrap();
        door.close().unwrap();

        assert!(!handle.is_open());
        assert_eq!(handle.open_reasons(), vec![OpenReason::Coins]);
        assert_eq!(handle.close_count(), 1);
    }

    #[test]
    fn test_failing_panel() {
        let (mut door, handle) = MockDoorPanel::new();
        handle.set_failing(true);

        assert!(matches!(
            door.open(OpenReason::Card),
            Err(HardwareError::ActuatorFailure { .. })
        ));
        assert!(!handle.is_open());
    }
}
