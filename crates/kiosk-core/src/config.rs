//! Kiosk configuration.
//!
//! Every field has a default taken from [`constants`](crate::constants), so a
//! configuration file only needs to list the values it overrides.
//!
//! # Examples
//!
//! ```
//! use kiosk_core::KioskConfig;
//!
//! let config = KioskConfig::from_json_str(r#"{ "required_amount_cents": 200 }"#).unwrap();
//! assert_eq!(config.required_amount_cents, 200);
//! assert_eq!(config.inactivity_timeout_secs, 20);
//! ```

use crate::constants::*;
use crate::error::{Error, Result};
use crate::types::Cents;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Fare, coin whitelist and timing for one kiosk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KioskConfig {
    /// Ticket price in cents.
    pub required_amount_cents: u32,

    /// Accepted coin denominations in cents.
    pub accepted_denominations_cents: Vec<u32>,

    /// Inactivity countdown while collecting coins.
    pub inactivity_timeout_secs: u32,

    /// Operator authentication window after the drawer opens.
    pub maintenance_auth_timeout_secs: u32,

    /// Simulated card processing time.
    pub card_processing_ms: u64,

    /// Success message hold before opening the gate.
    pub success_hold_ms: u64,

    /// Error message hold before moving on.
    pub error_hold_ms: u64,

    /// Timeout screen hold before returning to idle.
    pub timeout_return_ms: u64,

    /// Hold after a maintenance decision or reset before returning to idle.
    pub maintenance_return_ms: u64,

    /// Gate auto-close delay.
    pub door_auto_close_ms: u64,

    /// Settle time after the gate closes.
    pub door_settle_ms: u64,
}

impl KioskConfig {
    /// Parse a configuration from JSON and validate it.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if the text is not valid JSON for this type, or
    /// `Error::InvalidConfig` if validation fails.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: KioskConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read, plus every error of
    /// [`from_json_str`](Self::from_json_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check the configuration for values the kiosk cannot run with.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if:
    /// - the fare is zero
    /// - no denomination is accepted, or one of them is zero
    /// - either countdown is zero seconds
    pub fn validate(&self) -> Result<()> {
        if self.required_amount_cents == 0 {
            return Err(Error::InvalidConfig(
                "required_amount_cents must be greater than zero".to_string(),
            ));
        }
        if self.accepted_denominations_cents.is_empty() {
            return Err(Error::InvalidConfig(
                "accepted_denominations_cents must not be empty".to_string(),
            ));
        }
        if self.accepted_denominations_cents.contains(&0) {
            return Err(Error::InvalidConfig(
                "accepted_denominations_cents must not contain 0".to_string(),
            ));
        }
        if self.inactivity_timeout_secs == 0 {
            return Err(Error::InvalidConfig(
                "inactivity_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.maintenance_auth_timeout_secs == 0 {
            return Err(Error::InvalidConfig(
                "maintenance_auth_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn required_amount(&self) -> Cents {
        Cents::new(self.required_amount_cents)
    }

    pub fn accepted_denominations(&self) -> impl Iterator<Item = Cents> + '_ {
        self.accepted_denominations_cents.iter().copied().map(Cents::new)
    }

    pub fn card_processing(&self) -> Duration {
        Duration::from_millis(self.card_processing_ms)
    }

    pub fn success_hold(&self) -> Duration {
        Duration::from_millis(self.success_hold_ms)
    }

    pub fn error_hold(&self) -> Duration {
        Duration::from_millis(self.error_hold_ms)
    }

    pub fn timeout_return(&self) -> Duration {
        Duration::from_millis(self.timeout_return_ms)
    }

    pub fn maintenance_return(&self) -> Duration {
        Duration::from_millis(self.maintenance_return_ms)
    }

    pub fn door_auto_close(&self) -> Duration {
        Duration::from_millis(self.door_auto_close_ms)
    }

    pub fn door_settle(&self) -> Duration {
        Duration::from_millis(self.door_settle_ms)
    }
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            required_amount_cents: REQUIRED_AMOUNT_CENTS,
            accepted_denominations_cents: ACCEPTED_DENOMINATIONS_CENTS.to_vec(),
            inactivity_timeout_secs: INACTIVITY_TIMEOUT_SECS,
            maintenance_auth_timeout_secs: MAINTENANCE_AUTH_TIMEOUT_SECS,
            card_processing_ms: CARD_PROCESSING_MS,
            success_hold_ms: SUCCESS_HOLD_MS,
            error_hold_ms: ERROR_HOLD_MS,
            timeout_return_ms: TIMEOUT_RETURN_MS,
            maintenance_return_ms: MAINTENANCE_RETURN_MS,
            door_auto_close_ms: DOOR_AUTO_CLOSE_MS,
            door_settle_ms: DOOR_SETTLE_MS,
        }
    }
}
