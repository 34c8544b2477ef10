use crate::constants::CURRENCY_LABEL;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

/// Monetary amount in integer cents.
///
/// All kiosk money arithmetic goes through this type; there is no floating
/// point representation anywhere in the ledger.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Cents(u32);

impl Cents {
    /// Zero cents.
    pub const ZERO: Cents = Cents(0);

    /// Wrap a raw cent value.
    #[must_use]
    pub const fn new(cents: u32) -> Self {
        Cents(cents)
    }

    /// Get the raw cent value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns `true` if the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Subtract, clamping at zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use kiosk_core::Cents;
    ///
    /// assert_eq!(Cents::new(120).saturating_sub(Cents::new(50)), Cents::new(70));
    /// assert_eq!(Cents::new(20).saturating_sub(Cents::new(50)), Cents::ZERO);
    /// ```
    #[must_use]
    pub const fn saturating_sub(self, other: Cents) -> Cents {
        Cents(self.0.saturating_sub(other.0))
    }
}

impl From<u32> for Cents {
    fn from(cents: u32) -> Self {
        Cents(cents)
    }
}

impl Add for Cents {
    type Output = Cents;

    fn add(self, rhs: Cents) -> Cents {
        Cents(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Cents {
    fn add_assign(&mut self, rhs: Cents) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{:02} {}", self.0 / 100, self.0 % 100, CURRENCY_LABEL)
    }
}

/// Severity of a message shown on the kiosk screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Success => write!(f, "success"),
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Class of user-facing inputs that can be enabled or disabled together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputCategory {
    /// Coin slot.
    Coins,
    /// "Pay by card" button and card number entry.
    CardPayment,
    /// Contactless card / code reader. Also used for operator codes.
    ContactlessCard,
    /// QR scanner.
    Qr,
    /// Maintenance "open drawer" control.
    OpenDrawer,
    /// Maintenance "close drawer" control.
    CloseDrawer,
}

impl InputCategory {
    /// Every input category, in display order.
    pub const ALL: [InputCategory; 6] = [
        InputCategory::Coins,
        InputCategory::CardPayment,
        InputCategory::ContactlessCard,
        InputCategory::Qr,
        InputCategory::OpenDrawer,
        InputCategory::CloseDrawer,
    ];
}

impl fmt::Display for InputCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            InputCategory::Coins => "coins",
            InputCategory::CardPayment => "card_payment",
            InputCategory::ContactlessCard => "contactless_card",
            InputCategory::Qr => "qr",
            InputCategory::OpenDrawer => "open_drawer",
            InputCategory::CloseDrawer => "close_drawer",
        };
        write!(f, "{name}")
    }
}

/// Why the gate was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OpenReason {
    Coins,
    Card,
    Qr,
    CardAuthorized,
}

impl OpenReason {
    /// Stable string form used in logs.
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OpenReason::Coins => "coins",
            OpenReason::Card => "card",
            OpenReason::Qr => "qr",
            OpenReason::CardAuthorized => "card-authorized",
        }
    }
}

impl fmt::Display for OpenReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cash drawer position as reported by the drawer sensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawerState {
    Open,
    #[default]
    Closed,
}

impl DrawerState {
    /// Returns `true` if the drawer is open.
    #[inline]
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, DrawerState::Open)
    }
}

impl fmt::Display for DrawerState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DrawerState::Open => write!(f, "open"),
            DrawerState::Closed => write!(f, "closed"),
        }
    }
}

/// Who presented an access code.
///
/// The authorization rule is the same for every channel; the channel only
/// changes how the attempt is logged and what a success means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessChannel {
    /// Visitor scanning a QR code.
    Qr,
    /// Visitor tapping a contactless card.
    ContactlessCard,
    /// Maintenance operator entering a code.
    Operator,
}

impl fmt::Display for AccessChannel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AccessChannel::Qr => write!(f, "QR"),
            AccessChannel::ContactlessCard => write!(f, "contactless card"),
            AccessChannel::Operator => write!(f, "operator"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(120, "1.20 EUR")]
    #[case(5, "0.05 EUR")]
    #[case(0, "0.00 EUR")]
    #[case(1000, "10.00 EUR")]
    fn test_cents_display(#[case] cents: u32, #[case] expected: &str) {
        assert_eq!(Cents::new(cents).to_string(), expected);
    }

    #[test]
    fn test_cents_arithmetic() {
        let mut total = Cents::ZERO;
        total += Cents::new(100);
        total += Cents::new(20);

        assert_eq!(total, Cents::new(120));
        assert_eq!(total + Cents::new(5), Cents::new(125));
        assert!(Cents::ZERO.is_zero());
    }

    #[test]
    fn test_cents_serializes_as_integer() {
        let json = serde_json::to_string(&Cents::new(120)).unwrap();
        assert_eq!(json, "120");
    }

    #[rstest]
    #[case(OpenReason::Coins, "coins")]
    #[case(OpenReason::Card, "card")]
    #[case(OpenReason::Qr, "qr")]
    #[case(OpenReason::CardAuthorized, "card-authorized")]
    fn test_open_reason_strings(#[case] reason: OpenReason, #[case] expected: &str) {
        assert_eq!(reason.as_str(), expected);
        assert_eq!(
            serde_json::to_string(&reason).unwrap(),
            format!("\"{expected}\"")
        );
    }

    #[test]
    fn test_drawer_state_default_closed() {
        assert_eq!(DrawerState::default(), DrawerState::Closed);
        assert!(!DrawerState::Closed.is_open());
        assert!(DrawerState::Open.is_open());
    }

    #[test]
    fn test_input_category_all_unique() {
        let mut names: Vec<String> = InputCategory::ALL.iter().map(|c| c.to_string()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), InputCategory::ALL.len());
    }
}
