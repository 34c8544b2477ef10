//! Mock alarm sounder.

use crate::{HardwareError, Result, traits::Sounder};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct ToneLog {
    sounding: bool,
    starts: usize,
    stops: usize,
    failing: bool,
}

/// Sounder that records tone commands instead of producing sound.
#[derive(Debug)]
pub struct MockSounder {
    log: Arc<Mutex<ToneLog>>,
}

impl MockSounder {
    /// Create a sounder and the handle that observes it.
    pub fn new() -> (Self, MockSounderHandle) {
        let log = Arc::new(Mutex::new(ToneLog::default()));
        let handle = MockSounderHandle {
            log: Arc::clone(&log),
        };
        (Self { log }, handle)
    }
}

impl Sounder for MockSounder {
    fn start_tone(&mut self) -> Result<()> {
        let mut log = lock(&self.log);
        if log.failing {
            return Err(HardwareError::disconnected("speaker"));
        }
        log.sounding = true;
        log.starts += 1;
        Ok(())
    }

    fn stop_tone(&mut self) -> Result<()> {
        let mut log = lock(&self.log);
        if log.failing {
            return Err(HardwareError::disconnected("speaker"));
        }
        log.sounding = false;
        log.stops += 1;
        Ok(())
    }
}

/// Handle for inspecting a [`MockSounder`].
#[derive(Debug, Clone)]
pub struct MockSounderHandle {
    log: Arc<Mutex<ToneLog>>,
}

impl MockSounderHandle {
    /// Returns `true` while the tone is on.
    pub fn is_sounding(&self) -> bool {
        lock(&self.log).sounding
    }

    /// Number of start commands received.
    pub fn start_count(&self) -> usize {
        lock(&self.log).starts
    }

    /// Number of stop commands received.
    pub fn stop_count(&self) -> usize {
        lock(&self.log).stops
    }

    /// Make every following command fail.
    pub fn set_failing(&self, failing: bool) {
        lock(&self.log).failing = failing;
    }
}

fn lock(log: &Mutex<ToneLog>) -> MutexGuard<'_, ToneLog> {
    log.lock().unwrap_or_else(PoisonError::into_inner)
}
