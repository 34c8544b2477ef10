//! Core constants for the station entry kiosk.
//!
//! This module defines the fare, the accepted coin denominations, the access
//! code range and every delay the kiosk controller uses. These values are the
//! defaults of [`KioskConfig`](crate::config::KioskConfig); a deployment may
//! override the timing values through configuration.
//!
//! # Usage
//!
//! ```
//! use kiosk_core::constants::*;
//! use std::time::Duration;
//!
//! assert_eq!(REQUIRED_AMOUNT_CENTS, 120);
//! assert!(ACCEPTED_DENOMINATIONS_CENTS.contains(&50));
//!
//! let auto_close = Duration::from_millis(DOOR_AUTO_CLOSE_MS);
//! assert_eq!(auto_close.as_secs(), 15);
//! ```

// ============================================================================
// Fare and Coins
// ============================================================================

/// Ticket price in cents (1.20 EUR).
pub const REQUIRED_AMOUNT_CENTS: u32 = 120;

/// Coin denominations accepted by the coin slot, in cents.
///
/// Any coin outside this list is rejected without touching the ledger.
///
/// # Examples
///
/// ```
/// use kiosk_core::constants::ACCEPTED_DENOMINATIONS_CENTS;
///
/// assert!(ACCEPTED_DENOMINATIONS_CENTS.contains(&100));
/// assert!(!ACCEPTED_DENOMINATIONS_CENTS.contains(&200));
/// ```
pub const ACCEPTED_DENOMINATIONS_CENTS: [u32; 7] = [100, 50, 20, 10, 5, 2, 1];

/// Currency label used when formatting amounts.
pub const CURRENCY_LABEL: &str = "EUR";

// ============================================================================
// Access Codes
// ============================================================================

/// Lowest authorized access code (QR, contactless card, operator).
pub const MIN_AUTHORIZED_CODE: i64 = 1;

/// Highest authorized access code (QR, contactless card, operator).
pub const MAX_AUTHORIZED_CODE: i64 = 99;

// ============================================================================
// Card Payments
// ============================================================================

/// Leading digit identifying a VISA card number.
pub const VISA_PREFIX: char = '4';

/// Minimum accepted card number length.
pub const MIN_CARD_NUMBER_LENGTH: usize = 13;

/// Maximum accepted card number length.
pub const MAX_CARD_NUMBER_LENGTH: usize = 19;

// ============================================================================
// Countdowns (seconds)
// ============================================================================

/// Inactivity countdown armed while collecting coins.
pub const INACTIVITY_TIMEOUT_SECS: u32 = 20;

/// Time an operator has to authenticate after opening the cash drawer.
pub const MAINTENANCE_AUTH_TIMEOUT_SECS: u32 = 10;

/// Remaining seconds at or below which the maintenance countdown is urgent.
pub const MAINTENANCE_URGENT_THRESHOLD_SECS: u32 = 3;

// ============================================================================
// Delays (milliseconds)
// ============================================================================

/// Simulated card payment processing time.
pub const CARD_PROCESSING_MS: u64 = 1500;

/// How long a success message stays up before the gate opens.
pub const SUCCESS_HOLD_MS: u64 = 1000;

/// How long an error message stays up before the screen moves on.
pub const ERROR_HOLD_MS: u64 = 2000;

/// Delay between the timeout screen and the return to idle.
pub const TIMEOUT_RETURN_MS: u64 = 2000;

/// Delay before returning to idle after a maintenance decision or reset.
pub const MAINTENANCE_RETURN_MS: u64 = 3000;

/// Gate auto-close delay when nobody reports passing through.
pub const DOOR_AUTO_CLOSE_MS: u64 = 15000;

/// Settle time between the gate closing and the return to idle.
pub const DOOR_SETTLE_MS: u64 = 1500;

// ============================================================================
// History
// ============================================================================

/// Maximum number of entries kept in bounded in-memory histories.
pub const MAX_HISTORY_SIZE: usize = 100;
