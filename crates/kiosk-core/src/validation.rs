//! Access code and card number validation.
//!
//! Both checks are pure functions of their input. The same code rule applies
//! to every channel that presents a code: visitor QR scans, visitor
//! contactless cards, operator authentication and out-of-service resets.
//!
//! # Examples
//!
//! ```
//! use kiosk_core::validation::{is_card_accepted, is_code_authorized};
//!
//! assert!(is_code_authorized("42"));
//! assert!(!is_code_authorized("150"));
//!
//! assert!(is_card_accepted("4111111111111111"));
//! assert!(!is_card_accepted("5555555555554444"));
//! ```

use crate::constants::{
    MAX_AUTHORIZED_CODE, MAX_CARD_NUMBER_LENGTH, MIN_AUTHORIZED_CODE, MIN_CARD_NUMBER_LENGTH,
    VISA_PREFIX,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reason a card number was declined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardRejection {
    /// Card does not start with the VISA prefix.
    NotVisa,
    /// Card length is outside the accepted range.
    InvalidLength { length: usize },
}

impl fmt::Display for CardRejection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CardRejection::NotVisa => write!(f, "only VISA cards are accepted"),
            CardRejection::InvalidLength { length } => write!(
                f,
                "card number must be {MIN_CARD_NUMBER_LENGTH}-{MAX_CARD_NUMBER_LENGTH} digits, got {length}"
            ),
        }
    }
}

/// Check whether an access code is authorized.
///
/// A code is authorized iff it parses as an integer in
/// [`MIN_AUTHORIZED_CODE`]..=[`MAX_AUTHORIZED_CODE`]. Surrounding whitespace
/// is ignored. Non-numeric input is treated exactly like an out-of-range
/// number.
///
/// # Examples
///
/// ```
/// use kiosk_core::validation::is_code_authorized;
///
/// assert!(is_code_authorized("1"));
/// assert!(is_code_authorized("99"));
/// assert!(!is_code_authorized("0"));
/// assert!(!is_code_authorized("abc"));
/// assert!(!is_code_authorized(""));
/// ```
#[must_use]
pub fn is_code_authorized(code: &str) -> bool {
    code.trim()
        .parse::<i64>()
        .is_ok_and(|value| (MIN_AUTHORIZED_CODE..=MAX_AUTHORIZED_CODE).contains(&value))
}

/// Check a card number against the payment rules.
///
/// The brand is checked first; a non-VISA card is rejected without looking
/// at its length.
///
/// # Errors
///
/// Returns [`CardRejection::NotVisa`] if the number does not start with `4`,
/// or [`CardRejection::InvalidLength`] if its length is outside 13-19.
pub fn check_card(number: &str) -> Result<(), CardRejection> {
    if !number.starts_with(VISA_PREFIX) {
        return Err(CardRejection::NotVisa);
    }

    let length = number.chars().count();
    if !(MIN_CARD_NUMBER_LENGTH..=MAX_CARD_NUMBER_LENGTH).contains(&length) {
        return Err(CardRejection::InvalidLength { length });
    }

    Ok(())
}

/// Returns `true` if the card number would be accepted for payment.
#[inline]
#[must_use]
pub fn is_card_accepted(number: &str) -> bool {
    check_card(number).is_ok()
}
