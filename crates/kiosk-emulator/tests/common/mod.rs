//! Common test utilities for kiosk integration tests.
//!
//! [`TestKiosk`] builds a kiosk on a [`ManualClock`] with recording mocks for
//! every collaborator, so a test can move time forward explicitly and
//! inspect what the screen, the gate and the alarm were told to do.
//!
//! # Usage
//!
//! ```ignore
//! let mut t = common::TestKiosk::new();
//! t.kiosk.insert_coin(100);
//! t.advance_ms(20_000);
//! t.assert_state(KioskState::Timeout);
//! ```

#![allow(dead_code)]

use std::time::Duration;

use kiosk_core::{KioskConfig, ManualClock};
use kiosk_emulator::{Kiosk, KioskState};
use kiosk_hardware::mock::{
    MockDisplay, MockDisplayHandle, MockDoorPanel, MockDoorPanelHandle, MockSounder,
    MockSounderHandle,
};

/// A valid operator or visitor code.
pub const VALID_CODE: &str = "42";

/// A code outside the authorized range.
pub const INVALID_CODE: &str = "150";

/// A card number that passes brand and length checks.
pub const VISA_CARD: &str = "4111111111111111";

/// A card number with the wrong brand.
pub const MASTERCARD: &str = "5555555555554444";

/// Kiosk under test plus handles on its collaborators.
pub struct TestKiosk {
    pub kiosk: Kiosk,
    pub clock: ManualClock,
    pub display: MockDisplayHandle,
    pub door: MockDoorPanelHandle,
    pub sounder: MockSounderHandle,
}

impl TestKiosk {
    pub fn new() -> Self {
        Self::with_config(KioskConfig::default())
    }

    pub fn with_config(config: KioskConfig) -> Self {
        let clock = ManualClock::new();
        let (display_mock, display) = MockDisplay::new();
        let (door_mock, door) = MockDoorPanel::new();
        let (sounder_mock, sounder) = MockSounder::new();

        let kiosk = Kiosk::builder()
            .with_config(config)
            .with_clock(clock.clone())
            .with_display(display_mock)
            .with_door_panel(door_mock)
            .with_sounder(sounder_mock)
            .build()
            .expect("default test config is valid");

        Self {
            kiosk,
            clock,
            display,
            door,
            sounder,
        }
    }

    /// Move the clock forward and fire everything that came due.
    pub fn advance_ms(&mut self, millis: u64) {
        self.clock.advance(Duration::from_millis(millis));
        self.kiosk.poll();
    }

    pub fn advance_secs(&mut self, secs: u64) {
        self.advance_ms(secs * 1000);
    }

    #[track_caller]
    pub fn assert_state(&self, expected: KioskState) {
        assert_eq!(
            self.kiosk.state(),
            expected,
            "history: {:?}",
            self.path()
        );
    }

    /// Target states of every transition so far.
    pub fn path(&self) -> Vec<KioskState> {
        self.kiosk.history().iter().map(|t| t.to).collect()
    }

    /// Phases recorded in the maintenance journal.
    pub fn journal_phases(&self) -> Vec<&'static str> {
        self.kiosk
            .maintenance()
            .journal()
            .iter()
            .map(|entry| entry.event.phase())
            .collect()
    }

    /// Pay the fare with exact coins; the gate opens.
    pub fn pay_with_coins(&mut self) {
        assert!(self.kiosk.insert_coin(100));
        assert!(self.kiosk.insert_coin(20));
        self.assert_state(KioskState::GateOpen);
    }

    /// Open the drawer, authenticate and close it again.
    pub fn drive_to_zero_choice(&mut self) {
        assert!(self.kiosk.open_drawer());
        assert!(self.kiosk.submit_maintenance_code(VALID_CODE));
        assert!(self.kiosk.close_drawer());
        self.assert_state(KioskState::MaintZeroChoice);
    }

    /// Open the drawer and let the authentication window run out.
    pub fn drive_to_out_of_service(&mut self) {
        assert!(self.kiosk.open_drawer());
        self.advance_secs(10);
        self.assert_state(KioskState::OutOfService);
    }
}
