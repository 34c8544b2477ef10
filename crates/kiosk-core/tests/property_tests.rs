//! Property-based tests for the coin ledger and validation rules.
//!
//! These tests use proptest to generate random coin sequences and codes and
//! verify that the ledger and validator invariants hold for all of them.

use kiosk_core::constants::ACCEPTED_DENOMINATIONS_CENTS;
use kiosk_core::{Cents, CoinLedger, is_card_accepted, is_code_authorized};
use proptest::prelude::*;

/// Strategy for generating accepted coin values.
fn accepted_coin() -> impl Strategy<Value = u32> {
    prop::sample::select(ACCEPTED_DENOMINATIONS_CENTS.to_vec())
}

/// Strategy for generating arbitrary coin values, accepted or not.
fn any_coin() -> impl Strategy<Value = u32> {
    prop_oneof![accepted_coin(), 0u32..500]
}

proptest! {
    /// Property: the attempt total is the exact integer sum of accepted coins.
    #[test]
    fn prop_inserted_amount_is_exact_sum(coins in prop::collection::vec(accepted_coin(), 0..50)) {
        let mut ledger = CoinLedger::new();
        for coin in &coins {
            prop_assert!(ledger.insert(Cents::new(*coin)));
        }

        let expected: u32 = coins.iter().sum();
        prop_assert_eq!(ledger.inserted(), Cents::new(expected));
        prop_assert_eq!(ledger.drawer_balance(), Cents::new(expected));
        prop_assert_eq!(ledger.is_complete(), expected >= 120);
        prop_assert_eq!(ledger.remaining(), Cents::new(120u32.saturating_sub(expected)));
    }

    /// Property: rejected coins never change either total.
    #[test]
    fn prop_rejected_coins_are_ignored(coins in prop::collection::vec(any_coin(), 0..50)) {
        let mut ledger = CoinLedger::new();
        let mut expected = 0u32;
        for coin in coins {
            let accepted = ledger.insert(Cents::new(coin));
            prop_assert_eq!(accepted, ACCEPTED_DENOMINATIONS_CENTS.contains(&coin));
            if accepted {
                expected += coin;
            }
        }

        prop_assert_eq!(ledger.inserted(), Cents::new(expected));
        prop_assert_eq!(ledger.drawer_balance(), Cents::new(expected));
    }

    /// Property: resetting the attempt never touches the drawer, and zeroing
    /// the drawer never touches the attempt.
    #[test]
    fn prop_reset_and_zero_are_independent(
        before in prop::collection::vec(accepted_coin(), 0..20),
        after in prop::collection::vec(accepted_coin(), 0..20),
    ) {
        let mut ledger = CoinLedger::new();
        for coin in &before {
            ledger.insert(Cents::new(*coin));
        }

        let balance = ledger.drawer_balance();
        ledger.reset_attempt();
        prop_assert_eq!(ledger.drawer_balance(), balance);

        for coin in &after {
            ledger.insert(Cents::new(*coin));
        }

        let inserted = ledger.inserted();
        let zeroed = ledger.zero_drawer();
        prop_assert_eq!(ledger.inserted(), inserted);
        prop_assert_eq!(zeroed.as_u32(), before.iter().sum::<u32>() + after.iter().sum::<u32>());
        prop_assert_eq!(ledger.drawer_balance(), Cents::ZERO);
    }

    /// Property: every integer in 1..=99 is authorized.
    #[test]
    fn prop_codes_in_range_are_authorized(code in 1i64..=99) {
        prop_assert!(is_code_authorized(&code.to_string()));
    }

    /// Property: every integer outside 1..=99 is refused.
    #[test]
    fn prop_codes_out_of_range_are_refused(code in prop_oneof![i64::MIN..1i64, 100i64..i64::MAX]) {
        prop_assert!(!is_code_authorized(&code.to_string()));
    }

    /// Property: non-numeric text is never authorized.
    #[test]
    fn prop_non_numeric_codes_are_refused(code in "[a-zA-Z]{1,10}") {
        prop_assert!(!is_code_authorized(&code));
    }

    /// Property: card acceptance matches the brand and length rule exactly.
    #[test]
    fn prop_card_acceptance_rule(number in "[0-9]{0,25}") {
        let expected = number.starts_with('4') && (13..=19).contains(&number.len());
        prop_assert_eq!(is_card_accepted(&number), expected);
    }
}
