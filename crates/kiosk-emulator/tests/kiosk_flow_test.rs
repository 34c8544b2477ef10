//! Integration tests for complete kiosk flows.
//!
//! Every test drives a [`Kiosk`](kiosk_emulator::Kiosk) through its public
//! entry points on a manual clock and checks the state path plus what the
//! screen, the gate and the alarm were told to do.

mod common;

use common::{INVALID_CODE, MASTERCARD, TestKiosk, VALID_CODE, VISA_CARD};
use kiosk_core::{Cents, InputCategory, OpenReason, Severity};
use kiosk_emulator::{KioskState, MaintenanceEvent};
use rstest::rstest;

use KioskState::*;

// ============================================================================
// Reference Scenarios
// ============================================================================

#[test]
fn test_exact_coin_payment_opens_gate() {
    let mut t = TestKiosk::new();

    assert!(t.kiosk.insert_coin(100));
    t.assert_state(CoinPayment);
    assert_eq!(t.display.remaining_amount(), Some(Cents::new(20)));

    assert!(t.kiosk.insert_coin(20));

    t.assert_state(GateOpen);
    assert_eq!(t.kiosk.ledger().remaining(), Cents::ZERO);
    assert!(t.kiosk.ledger().is_complete());
    assert_eq!(t.kiosk.door().open_reason(), Some(OpenReason::Coins));
    assert_eq!(t.door.open_reasons(), vec![OpenReason::Coins]);
    assert!(t.display.is_person_passed_visible());
    assert_eq!(t.path(), vec![CoinPayment, GateOpen]);
}

#[test]
fn test_unauthorized_qr_returns_to_idle() {
    let mut t = TestKiosk::new();

    assert!(t.kiosk.verify_qr(INVALID_CODE));
    t.assert_state(QrCheck);
    assert_eq!(
        t.display.last_message(),
        Some(("Access denied".to_string(), Severity::Error))
    );

    t.advance_ms(1_999);
    t.assert_state(QrCheck);
    t.advance_ms(1);

    t.assert_state(Idle);
    assert!(t.door.open_reasons().is_empty());
    assert!(!t.kiosk.door().is_open());
}

#[test]
fn test_drawer_auth_timeout_goes_out_of_service() {
    let mut t = TestKiosk::new();

    assert!(t.kiosk.open_drawer());
    t.assert_state(MaintAuthPending);
    assert_eq!(t.display.maintenance_countdown(), Some(10));

    t.advance_secs(3);
    assert_eq!(t.display.maintenance_countdown(), Some(7));

    t.advance_secs(7);

    t.assert_state(OutOfService);
    assert!(t.kiosk.alarm().is_active());
    assert!(t.sounder.is_sounding());
    assert!(t.display.is_out_of_service());
    assert_eq!(t.display.maintenance_countdown(), None);
    assert_eq!(t.journal_phases(), vec!["opened", "timeout", "out_of_service"]);
}

#[test]
fn test_operator_code_restores_out_of_service() {
    let mut t = TestKiosk::new();
    t.drive_to_out_of_service();

    assert!(t.kiosk.submit_maintenance_code("7"));

    assert!(!t.kiosk.alarm().is_active());
    assert!(!t.sounder.is_sounding());
    t.assert_state(OutOfService);

    t.advance_ms(3_000);

    t.assert_state(Idle);
    assert_eq!(t.sounder.start_count(), 1);
    assert_eq!(t.sounder.stop_count(), 1);
    assert_eq!(t.journal_phases().last(), Some(&"reset"));
    assert!(t.kiosk.maintenance().current_operation().is_none());
}

#[test]
fn test_person_passed_after_card_payment() {
    let mut t = TestKiosk::new();

    assert!(t.kiosk.start_card_payment());
    assert!(t.kiosk.submit_card_number(VISA_CARD));
    t.advance_ms(1_500);
    assert_eq!(
        t.display.last_message(),
        Some(("Payment accepted".to_string(), Severity::Success))
    );
    t.advance_ms(1_000);
    t.assert_state(GateOpen);
    assert_eq!(t.kiosk.door().open_reason(), Some(OpenReason::Card));

    t.advance_secs(3);
    assert!(t.kiosk.on_person_passed());

    assert!(!t.kiosk.door().is_open());
    assert_eq!(t.kiosk.door().auto_close_handle(), None);
    assert_eq!(t.door.close_count(), 1);
    t.assert_state(GateOpen);

    t.advance_ms(1_499);
    t.assert_state(GateOpen);
    t.advance_ms(1);
    t.assert_state(Idle);

    // The cancelled auto-close never fires
    t.advance_secs(20);
    assert_eq!(t.door.close_count(), 1);
}

#[rstest]
#[case(true, Cents::ZERO)]
#[case(false, Cents::new(120))]
fn test_zero_decision(#[case] zero: bool, #[case] expected_after: Cents) {
    let mut t = TestKiosk::new();
    t.pay_with_coins();
    assert!(t.kiosk.on_person_passed());
    t.advance_ms(1_500);
    t.assert_state(Idle);
    assert_eq!(t.kiosk.ledger().drawer_balance(), Cents::new(120));

    t.drive_to_zero_choice();
    assert_eq!(t.display.zero_prompt(), Some(Cents::new(120)));

    assert!(t.kiosk.confirm_zero(zero));

    assert_eq!(t.kiosk.ledger().drawer_balance(), expected_after);
    assert_eq!(t.display.zero_prompt(), None);
    let last = t.kiosk.maintenance().journal().back().unwrap();
    assert_eq!(
        last.event,
        MaintenanceEvent::ZeroDecision {
            zeroed: zero,
            balance_before: Cents::new(120),
            balance_after: expected_after,
        }
    );
    assert!(t.kiosk.maintenance().current_operation().is_none());

    t.advance_ms(3_000);
    t.assert_state(Idle);
    assert_eq!(
        t.journal_phases(),
        vec!["opened", "auth_success", "closed", "zero_decision"]
    );
}

// ============================================================================
// Coins
// ============================================================================

#[test]
fn test_rejected_coin_from_idle_enters_coin_payment() {
    let mut t = TestKiosk::new();

    assert!(!t.kiosk.insert_coin(3));

    t.assert_state(CoinPayment);
    assert_eq!(t.kiosk.ledger().inserted(), Cents::ZERO);
    assert_eq!(t.kiosk.ledger().drawer_balance(), Cents::ZERO);
    let (text, severity) = t.display.last_message().unwrap();
    assert!(text.starts_with("Coin not accepted"));
    assert_eq!(severity, Severity::Warning);
}

#[test]
fn test_coin_refused_outside_coin_payment() {
    let mut t = TestKiosk::new();
    t.pay_with_coins();

    assert!(!t.kiosk.insert_coin(50));
    assert_eq!(t.kiosk.ledger().drawer_balance(), Cents::new(120));
}

#[test]
fn test_whitelisted_sequence_sums_exactly() {
    let mut t = TestKiosk::new();
    for coin in [10, 20, 20, 20] {
        assert!(t.kiosk.insert_coin(coin));
    }
    t.assert_state(CoinPayment);
    assert_eq!(t.display.remaining_amount(), Some(Cents::new(50)));

    assert!(t.kiosk.insert_coin(50));
    t.assert_state(GateOpen);
    assert_eq!(t.kiosk.ledger().inserted(), Cents::new(120));
}

#[test]
fn test_inactivity_timeout_abandons_payment() {
    let mut t = TestKiosk::new();
    t.kiosk.insert_coin(50);
    assert_eq!(t.display.inactivity_countdown(), Some(20));

    t.advance_secs(5);
    assert_eq!(t.display.inactivity_countdown(), Some(15));

    t.advance_secs(15);
    t.assert_state(Timeout);
    assert_eq!(
        t.display.last_message(),
        Some(("Timeout - Operation cancelled".to_string(), Severity::Warning))
    );

    t.advance_secs(2);
    t.assert_state(Idle);
    assert_eq!(t.kiosk.ledger().inserted(), Cents::ZERO);
    assert_eq!(t.kiosk.ledger().drawer_balance(), Cents::new(50));
    assert_eq!(t.display.inactivity_countdown(), None);
}

#[test]
fn test_each_coin_rearms_inactivity() {
    let mut t = TestKiosk::new();
    t.kiosk.insert_coin(50);

    t.advance_secs(15);
    t.kiosk.insert_coin(20);
    assert_eq!(t.display.inactivity_countdown(), Some(20));

    t.advance_secs(15);
    t.assert_state(CoinPayment);
    t.advance_secs(5);
    t.assert_state(Timeout);
}

// ============================================================================
// Card Payment
// ============================================================================

#[rstest]
#[case::wrong_brand(MASTERCARD)]
#[case::too_short("4111")]
#[case::too_long("41111111111111111111")]
fn test_declined_card_returns_to_idle(#[case] number: &str) {
    let mut t = TestKiosk::new();
    t.kiosk.start_card_payment();
    assert!(t.kiosk.submit_card_number(number));

    t.advance_ms(1_500);
    assert_eq!(
        t.display.last_message(),
        Some(("Payment declined - Try again".to_string(), Severity::Error))
    );
    t.advance_ms(2_000);

    t.assert_state(Idle);
    assert!(t.door.open_reasons().is_empty());
}

#[test]
fn test_card_number_refused_outside_card_payment() {
    let mut t = TestKiosk::new();
    assert!(!t.kiosk.submit_card_number(VISA_CARD));
    t.assert_state(Idle);
}

#[test]
fn test_reset_cancels_pending_card_success() {
    let mut t = TestKiosk::new();
    t.kiosk.start_card_payment();
    t.kiosk.submit_card_number(VISA_CARD);
    t.advance_ms(1_500);

    t.kiosk.reset();
    t.advance_secs(5);

    t.assert_state(Idle);
    assert!(t.door.open_reasons().is_empty());
    assert_eq!(t.kiosk.next_deadline(), None);
}

// ============================================================================
// Access Codes
// ============================================================================

#[rstest]
#[case::qr(true, OpenReason::Qr, QrCheck)]
#[case::contactless(false, OpenReason::CardAuthorized, CardCheck)]
fn test_authorized_code_opens_gate(
    #[case] use_qr: bool,
    #[case] reason: OpenReason,
    #[case] check_state: KioskState,
) {
    let mut t = TestKiosk::new();
    let started = if use_qr {
        t.kiosk.verify_qr(VALID_CODE)
    } else {
        t.kiosk.verify_card(VALID_CODE)
    };
    assert!(started);
    t.assert_state(check_state);
    assert!(InputCategory::ALL.iter().all(|c| !t.display.is_input_enabled(*c)));

    t.advance_ms(1_000);

    t.assert_state(GateOpen);
    assert_eq!(t.door.open_reasons(), vec![reason]);
}

#[test]
fn test_qr_refused_outside_idle() {
    let mut t = TestKiosk::new();
    t.kiosk.insert_coin(50);

    assert!(!t.kiosk.verify_qr(VALID_CODE));
    t.assert_state(CoinPayment);
}

// ============================================================================
// Gate
// ============================================================================

#[test]
fn test_gate_auto_closes_then_settles() {
    let mut t = TestKiosk::new();
    t.pay_with_coins();

    t.advance_ms(14_999);
    assert!(t.kiosk.door().is_open());

    t.advance_ms(1);
    assert!(!t.kiosk.door().is_open());
    assert_eq!(t.door.close_count(), 1);
    assert!(!t.display.is_person_passed_visible());
    t.assert_state(GateOpen);

    t.advance_ms(1_500);
    t.assert_state(Idle);
}

#[test]
fn test_person_passed_only_once() {
    let mut t = TestKiosk::new();
    assert!(!t.kiosk.on_person_passed());

    t.pay_with_coins();
    assert!(t.kiosk.on_person_passed());
    assert!(!t.kiosk.on_person_passed());
    assert_eq!(t.door.close_count(), 1);
}

// ============================================================================
// Cash Drawer Maintenance
// ============================================================================

#[test]
fn test_drawer_opened_during_gate_open_closes_door() {
    let mut t = TestKiosk::new();
    t.pay_with_coins();

    assert!(t.kiosk.open_drawer());

    t.assert_state(MaintAuthPending);
    assert!(!t.kiosk.door().is_open());
    assert_eq!(t.door.close_count(), 1);

    // Auto-close was cancelled with the gate state
    t.advance_secs(16);
    assert_eq!(t.door.close_count(), 1);
}

#[test]
fn test_drawer_opened_during_coin_payment_aborts_attempt() {
    let mut t = TestKiosk::new();
    t.kiosk.insert_coin(50);

    assert!(t.kiosk.open_drawer());

    t.assert_state(MaintAuthPending);
    assert_eq!(t.kiosk.ledger().inserted(), Cents::ZERO);
    assert_eq!(t.kiosk.ledger().drawer_balance(), Cents::new(50));
    assert!(!t.kiosk.inactivity().is_running());
    assert_eq!(t.display.inactivity_countdown(), None);
}

#[test]
fn test_drawer_opened_during_code_check_is_ignored() {
    let mut t = TestKiosk::new();
    t.kiosk.verify_qr(VALID_CODE);

    assert!(!t.kiosk.open_drawer());

    t.assert_state(QrCheck);
    assert!(t.kiosk.sensor().is_open());
}

#[test]
fn test_maintenance_inputs() {
    let mut t = TestKiosk::new();
    t.kiosk.open_drawer();

    assert!(t.display.is_input_enabled(InputCategory::ContactlessCard));
    assert!(!t.display.is_input_enabled(InputCategory::Coins));
    assert!(!t.display.is_input_enabled(InputCategory::CloseDrawer));

    t.kiosk.verify_card(VALID_CODE);

    t.assert_state(MaintAwaitingClose);
    assert!(t.display.is_input_enabled(InputCategory::CloseDrawer));
    assert!(!t.display.is_input_enabled(InputCategory::ContactlessCard));
    assert_eq!(t.display.maintenance_countdown(), None);
}

#[test]
fn test_wrong_operator_code_keeps_countdown_running() {
    let mut t = TestKiosk::new();
    t.kiosk.open_drawer();
    t.advance_secs(2);

    assert!(!t.kiosk.submit_maintenance_code("0"));
    assert_eq!(
        t.display.last_message(),
        Some(("Access denied (0)".to_string(), Severity::Error))
    );

    t.advance_secs(2);
    assert_eq!(
        t.display.last_message(),
        Some((
            "Drawer open - Authentication required".to_string(),
            Severity::Warning
        ))
    );
    t.assert_state(MaintAuthPending);

    t.advance_secs(6);
    t.assert_state(OutOfService);
    assert_eq!(
        t.journal_phases(),
        vec!["opened", "auth_fail", "timeout", "out_of_service"]
    );
}

#[test]
fn test_drawer_close_only_after_authentication() {
    let mut t = TestKiosk::new();
    t.kiosk.open_drawer();

    assert!(!t.kiosk.close_drawer());
    t.assert_state(MaintAuthPending);
}

#[test]
fn test_repeated_drawer_open_is_ignored() {
    let mut t = TestKiosk::new();
    assert!(t.kiosk.open_drawer());
    assert!(!t.kiosk.open_drawer());

    t.assert_state(MaintAuthPending);
    assert_eq!(t.journal_phases(), vec!["opened"]);
}

#[test]
fn test_wrong_code_out_of_service_restores_screen() {
    let mut t = TestKiosk::new();
    t.drive_to_out_of_service();

    assert!(!t.kiosk.verify_card(INVALID_CODE));
    assert!(!t.display.is_out_of_service());
    assert!(t.kiosk.alarm().is_active());

    t.advance_secs(2);
    assert!(t.display.is_out_of_service());
    t.assert_state(OutOfService);
}

#[test]
fn test_single_pending_return_after_reset_code() {
    let mut t = TestKiosk::new();
    t.drive_to_out_of_service();

    assert!(t.kiosk.submit_maintenance_code(VALID_CODE));
    t.advance_secs(1);
    assert!(t.kiosk.submit_maintenance_code(VALID_CODE));
    t.advance_secs(5);

    t.assert_state(Idle);
    let idle_entries = t.path().iter().filter(|s| **s == Idle).count();
    assert_eq!(idle_entries, 1);
    let resets = t.journal_phases().iter().filter(|p| **p == "reset").count();
    assert_eq!(resets, 1);
}

#[test]
fn test_confirm_zero_only_once() {
    let mut t = TestKiosk::new();
    assert!(!t.kiosk.confirm_zero(true));

    t.drive_to_zero_choice();
    assert!(t.kiosk.confirm_zero(false));
    assert!(!t.kiosk.confirm_zero(true));
}

// ============================================================================
// Reset
// ============================================================================

#[test]
fn test_reset_from_out_of_service() {
    let mut t = TestKiosk::new();
    t.drive_to_out_of_service();

    t.kiosk.reset();

    t.assert_state(Idle);
    assert!(!t.kiosk.alarm().is_active());
    assert!(!t.sounder.is_sounding());
    assert!(t.kiosk.maintenance().current_operation().is_none());
    assert_eq!(
        t.kiosk.maintenance().journal().back().map(|e| e.event.clone()),
        Some(MaintenanceEvent::Reset { code: None })
    );
    assert!(t.kiosk.history().back().unwrap().forced);
}

#[test]
fn test_reset_stops_inactivity_countdown() {
    let mut t = TestKiosk::new();
    t.kiosk.insert_coin(20);

    t.kiosk.reset();
    t.advance_secs(30);

    t.assert_state(Idle);
    assert_eq!(t.kiosk.ledger().inserted(), Cents::ZERO);
    assert!(!t.path().contains(&Timeout));
}

#[test]
fn test_idle_enables_every_input() {
    let mut t = TestKiosk::new();
    t.kiosk.insert_coin(20);
    t.kiosk.reset();

    assert!(InputCategory::ALL.iter().all(|c| t.display.is_input_enabled(*c)));
    assert!(!t.display.is_person_passed_visible());
    assert_eq!(t.display.remaining_amount(), None);
}
