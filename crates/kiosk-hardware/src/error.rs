//! Error types for kiosk peripherals.
//!
//! Peripherals are driven fire-and-forget by the kiosk controller: a failing
//! door actuator or sounder is logged, never propagated into the state
//! machine. These errors describe what went wrong for that log line.

pub type Result<T> = std::result::Result<T, HardwareError>;

/// Failure reported by a kiosk peripheral.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// The peripheral did not answer.
    #[error("Peripheral disconnected: {device}")]
    Disconnected { device: String },

    /// The peripheral answered but could not complete the command.
    #[error("Actuator failure: {message}")]
    ActuatorFailure { message: String },
}

impl HardwareError {
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    pub fn actuator(message: impl Into<String>) -> Self {
        Self::ActuatorFailure {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_names_device() {
        let error = HardwareError::disconnected("speaker");
        assert!(matches!(error, HardwareError::Disconnected { .. }));
        assert_eq!(error.to_string(), "Peripheral disconnected: speaker");
    }

    #[test]
    fn test_actuator_failure_message() {
        let error = HardwareError::actuator("door jammed");
        assert_eq!(error.to_string(), "Actuator failure: door jammed");
    }
}
