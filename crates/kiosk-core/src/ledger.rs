//! Coin acceptor ledger.
//!
//! The ledger tracks two independent totals:
//!
//! - the **attempt** total: coins inserted for the ticket currently being
//!   paid, cleared by [`CoinLedger::reset_attempt`]
//! - the **drawer balance**: every coin ever accepted, cleared only by
//!   [`CoinLedger::zero_drawer`] during maintenance
//!
//! # Examples
//!
//! ```
//! use kiosk_core::{Cents, CoinLedger};
//!
//! let mut ledger = CoinLedger::new();
//! assert!(ledger.insert(Cents::new(100)));
//! assert!(ledger.insert(Cents::new(20)));
//! assert!(ledger.is_complete());
//!
//! ledger.reset_attempt();
//! assert_eq!(ledger.drawer_balance(), Cents::new(120));
//! ```

use crate::constants::{ACCEPTED_DENOMINATIONS_CENTS, REQUIRED_AMOUNT_CENTS};
use crate::error::Error;
use crate::types::Cents;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Integer-cent ledger for the coin slot and cash drawer.
#[derive(Debug, Clone, Serialize)]
pub struct CoinLedger {
    required: Cents,
    inserted: Cents,
    drawer_balance: Cents,
    inserted_coins: Vec<Cents>,
    #[serde(skip)]
    denominations: Vec<Cents>,
}

impl CoinLedger {
    /// Create a ledger with the default fare and denominations.
    pub fn new() -> Self {
        Self::with_required_amount(Cents::new(REQUIRED_AMOUNT_CENTS))
    }

    /// Create a ledger with a custom fare and the default denominations.
    pub fn with_required_amount(required: Cents) -> Self {
        Self {
            required,
            inserted: Cents::ZERO,
            drawer_balance: Cents::ZERO,
            inserted_coins: Vec::new(),
            denominations: ACCEPTED_DENOMINATIONS_CENTS
                .iter()
                .copied()
                .map(Cents::new)
                .collect(),
        }
    }

    /// Replace the accepted denominations.
    pub fn with_denominations(mut self, denominations: impl IntoIterator<Item = Cents>) -> Self {
        self.denominations = denominations.into_iter().collect();
        self
    }

    /// Returns `true` if a coin of this value is accepted.
    #[must_use]
    pub fn accepts(&self, coin: Cents) -> bool {
        self.denominations.contains(&coin)
    }

    /// Insert a coin.
    ///
    /// Accepted coins increase both the attempt total and the drawer
    /// balance. Unknown denominations leave the ledger untouched.
    ///
    /// # Returns
    ///
    /// Returns `true` if the coin was accepted.
    pub fn insert(&mut self, coin: Cents) -> bool {
        if !self.accepts(coin) {
            warn!(error = %Error::InvalidDenomination { cents: coin.as_u32() }, "Coin rejected");
            return false;
        }

        self.inserted += coin;
        self.drawer_balance += coin;
        self.inserted_coins.push(coin);

        debug!(
            coin = coin.as_u32(),
            inserted = self.inserted.as_u32(),
            remaining = self.remaining().as_u32(),
            drawer_balance = self.drawer_balance.as_u32(),
            "Coin accepted"
        );
        true
    }

    /// Amount still owed for the current attempt, never negative.
    #[must_use]
    pub fn remaining(&self) -> Cents {
        self.required.saturating_sub(self.inserted)
    }

    /// Returns `true` once the inserted amount covers the fare.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.inserted >= self.required
    }

    /// Clear the current attempt. The drawer balance is not touched.
    pub fn reset_attempt(&mut self) {
        if !self.inserted.is_zero() {
            debug!(
                inserted = self.inserted.as_u32(),
                "Payment attempt reset"
            );
        }
        self.inserted = Cents::ZERO;
        self.inserted_coins.clear();
    }

    /// Empty the cash drawer.
    ///
    /// # Returns
    ///
    /// Returns the balance held before zeroing; zero if it was already empty.
    pub fn zero_drawer(&mut self) -> Cents {
        let previous = self.drawer_balance;
        if previous.is_zero() {
            return Cents::ZERO;
        }
        self.drawer_balance = Cents::ZERO;
        info!(previous = previous.as_u32(), "Cash drawer zeroed");
        previous
    }

    /// Fare for one entry.
    #[must_use]
    pub fn required(&self) -> Cents {
        self.required
    }

    /// Amount inserted during the current attempt.
    #[must_use]
    pub fn inserted(&self) -> Cents {
        self.inserted
    }

    /// Total held in the cash drawer.
    #[must_use]
    pub fn drawer_balance(&self) -> Cents {
        self.drawer_balance
    }

    /// Denominations inserted during the current attempt, in order.
    #[must_use]
    pub fn inserted_coins(&self) -> &[Cents] {
        &self.inserted_coins
    }
}

impl Default for CoinLedger {
    fn default() -> Self {
        Self::new()
    }
}
