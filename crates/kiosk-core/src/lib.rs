//! Core types and rules for the station entry kiosk.
//!
//! This crate holds everything that does not depend on a clock-driven state
//! machine or on external devices: constants, errors, money, the code and
//! card validation rules, the coin ledger and configuration.

pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod ledger;
pub mod types;
pub mod validation;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::KioskConfig;
pub use error::{Error, Result};
pub use ledger::CoinLedger;
pub use types::*;
pub use validation::{CardRejection, check_card, is_card_accepted, is_code_authorized};

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
