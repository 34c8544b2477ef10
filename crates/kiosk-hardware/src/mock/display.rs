//! Recording display for tests and development.
//!
//! [`MockDisplay`] records every call the controller makes and keeps a
//! model of what the screen currently shows. The paired
//! [`MockDisplayHandle`] reads that model from outside the controller.

use crate::traits::KioskDisplay;
use kiosk_core::{Cents, InputCategory, Severity};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One call received by the display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayCall {
    Message { text: String, severity: Severity },
    RemainingAmount(Cents),
    HideRemainingAmount,
    InactivityCountdown(u32),
    HideInactivityCountdown,
    MaintenanceCountdown(u32),
    ZeroChoicePrompt(Cents),
    HideZeroChoicePrompt,
    OutOfService,
    InputEnabled { category: InputCategory, enabled: bool },
    PersonPassedButton(bool),
    DrawerBalance(Cents),
}

#[derive(Debug, Default)]
struct Screen {
    calls: Vec<DisplayCall>,
    message: Option<(String, Severity)>,
    remaining: Option<Cents>,
    inactivity: Option<u32>,
    maintenance: Option<u32>,
    zero_prompt: Option<Cents>,
    out_of_service: bool,
    inputs: HashMap<InputCategory, bool>,
    person_passed_visible: bool,
    drawer_balance: Option<Cents>,
}

/// Display that records calls into shared memory.
///
/// # Examples
///
/// ```
/// use kiosk_hardware::mock::MockDisplay;
/// use kiosk_hardware::traits::KioskDisplay;
/// use kiosk_core::Severity;
///
/// let (mut display, handle) = MockDisplay::new();
/// display.show_message("Welcome", Severity::Info);
///
/// assert_eq!(handle.last_message(), Some(("Welcome".to_string(), Severity::Info)));
/// ```
#[derive(Debug)]
pub struct MockDisplay {
    screen: Arc<Mutex<Screen>>,
}

impl MockDisplay {
    /// Create a display and the handle that observes it.
    pub fn new() -> (Self, MockDisplayHandle) {
        let screen = Arc::new(Mutex::new(Screen::default()));
        let handle = MockDisplayHandle {
            screen: Arc::clone(&screen),
        };
        (Self { screen }, handle)
    }

    fn record(&mut self, call: DisplayCall) {
        let mut screen = lock(&self.screen);
        match &call {
            DisplayCall::Message { text, severity } => {
                screen.message = Some((text.clone(), *severity));
                screen.out_of_service = false;
            }
            DisplayCall::RemainingAmount(cents) => screen.remaining = Some(*cents),
            DisplayCall::HideRemainingAmount => screen.remaining = None,
            DisplayCall::InactivityCountdown(secs) => screen.inactivity = Some(*secs),
            DisplayCall::HideInactivityCountdown => screen.inactivity = None,
            DisplayCall::MaintenanceCountdown(0) => screen.maintenance = None,
            DisplayCall::MaintenanceCountdown(secs) => screen.maintenance = Some(*secs),
            DisplayCall::ZeroChoicePrompt(balance) => screen.zero_prompt = Some(*balance),
            DisplayCall::HideZeroChoicePrompt => screen.zero_prompt = None,
            DisplayCall::OutOfService => screen.out_of_service = true,
            DisplayCall::InputEnabled { category, enabled } => {
                screen.inputs.insert(*category, *enabled);
            }
            DisplayCall::PersonPassedButton(visible) => screen.person_passed_visible = *visible,
            DisplayCall::DrawerBalance(balance) => screen.drawer_balance = Some(*balance),
        }
        screen.calls.push(call);
    }
}

impl KioskDisplay for MockDisplay {
    fn show_message(&mut self, text: &str, severity: Severity) {
        self.record(DisplayCall::Message {
            text: text.to_string(),
            severity,
        });
    }

    fn show_remaining_amount(&mut self, remaining: Cents) {
        self.record(DisplayCall::RemainingAmount(remaining));
    }

    fn hide_remaining_amount(&mut self) {
        self.record(DisplayCall::HideRemainingAmount);
    }

    fn show_inactivity_countdown(&mut self, seconds: u32) {
        self.record(DisplayCall::InactivityCountdown(seconds));
    }

    fn hide_inactivity_countdown(&mut self) {
        self.record(DisplayCall::HideInactivityCountdown);
    }

    fn show_maintenance_countdown(&mut self, seconds: u32) {
        self.record(DisplayCall::MaintenanceCountdown(seconds));
    }

    fn show_zero_choice_prompt(&mut self, balance: Cents) {
        self.record(DisplayCall::ZeroChoicePrompt(balance));
    }

    fn hide_zero_choice_prompt(&mut self) {
        self.record(DisplayCall::HideZeroChoicePrompt);
    }

    fn show_out_of_service(&mut self) {
        self.record(DisplayCall::OutOfService);
    }

    fn set_input_enabled(&mut self, category: InputCategory, enabled: bool) {
        self.record(DisplayCall::InputEnabled { category, enabled });
    }

    fn set_person_passed_button_visible(&mut self, visible: bool) {
        self.record(DisplayCall::PersonPassedButton(visible));
    }

    fn show_drawer_balance(&mut self, balance: Cents) {
        self.record(DisplayCall::DrawerBalance(balance));
    }
}

/// Read-only view of a [`MockDisplay`].
///
/// The handle can be cloned and kept by a test after the display itself has
/// been moved into the controller.
#[derive(Debug, Clone)]
pub struct MockDisplayHandle {
    screen: Arc<Mutex<Screen>>,
}

impl MockDisplayHandle {
    /// Every call received so far, oldest first.
    pub fn calls(&self) -> Vec<DisplayCall> {
        lock(&self.screen).calls.clone()
    }

    /// Forget recorded calls. The current screen model is kept.
    pub fn clear_calls(&self) {
        lock(&self.screen).calls.clear();
    }

    /// Every message text shown so far, oldest first.
    pub fn messages(&self) -> Vec<String> {
        lock(&self.screen)
            .calls
            .iter()
            .filter_map(|call| match call {
                DisplayCall::Message { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// The message currently on screen.
    pub fn last_message(&self) -> Option<(String, Severity)> {
        lock(&self.screen).message.clone()
    }

    /// Remaining amount currently shown, if any.
    pub fn remaining_amount(&self) -> Option<Cents> {
        lock(&self.screen).remaining
    }

    /// Inactivity countdown currently shown, if any.
    pub fn inactivity_countdown(&self) -> Option<u32> {
        lock(&self.screen).inactivity
    }

    /// Maintenance countdown currently shown, if any.
    pub fn maintenance_countdown(&self) -> Option<u32> {
        lock(&self.screen).maintenance
    }

    /// Balance shown in the zero choice prompt, if the prompt is up.
    pub fn zero_prompt(&self) -> Option<Cents> {
        lock(&self.screen).zero_prompt
    }

    /// Returns `true` while the out-of-service screen is showing.
    pub fn is_out_of_service(&self) -> bool {
        lock(&self.screen).out_of_service
    }

    /// Returns `true` if the category was last enabled. Unknown categories
    /// count as disabled.
    pub fn is_input_enabled(&self, category: InputCategory) -> bool {
        lock(&self.screen)
            .inputs
            .get(&category)
            .copied()
            .unwrap_or(false)
    }

    /// Returns `true` while the "person passed" button is visible.
    pub fn is_person_passed_visible(&self) -> bool {
        lock(&self.screen).person_passed_visible
    }

    /// Last drawer balance pushed to the maintenance panel.
    pub fn drawer_balance(&self) -> Option<Cents> {
        lock(&self.screen).drawer_balance
    }
}

fn lock(screen: &Mutex<Screen>) -> MutexGuard<'_, Screen> {
    screen.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_calls_in_order() {
        let (mut display, handle) = MockDisplay::new();

        display.show_message("Insert coins", Severity::Info);
        display.show_remaining_amount(Cents::new(120));

        assert_eq!(
            handle.calls(),
            vec![
                DisplayCall::Message {
                    text: "Insert coins".to_string(),
                    severity: Severity::Info
                },
                DisplayCall::RemainingAmount(Cents::new(120)),
            ]
        );
    }

    #[test]
    fn test_screen_model_tracks_visibility() {
        let (mut display, handle) = MockDisplay::new();

        display.show_inactivity_countdown(20);
        assert_eq!(handle.inactivity_countdown(), Some(20));
        display.hide_inactivity_countdown();
        assert_eq!(handle.inactivity_countdown(), None);

        display.show_maintenance_countdown(10);
        assert_eq!(handle.maintenance_countdown(), Some(10));
        display.show_maintenance_countdown(0);
        assert_eq!(handle.maintenance_countdown(), None);
    }

    #[test]
    fn test_inputs_default_to_disabled() {
        let (mut display, handle) = MockDisplay::new();

        assert!(!handle.is_input_enabled(InputCategory::Coins));
        display.set_input_enabled(InputCategory::Coins, true);
        assert!(handle.is_input_enabled(InputCategory::Coins));
    }

    #[test]
    fn test_message_replaces_out_of_service_screen() {
        let (mut display, handle) = MockDisplay::new();

        display.show_out_of_service();
        assert!(handle.is_out_of_service());
        display.show_message("Access denied", Severity::Error);
        assert!(!handle.is_out_of_service());
    }

    #[test]
    fn test_clear_calls_keeps_screen() {
        let (mut display, handle) = MockDisplay::new();
        display.show_message("Welcome", Severity::Info);

        handle.clear_calls();

        assert!(handle.calls().is_empty());
        assert!(handle.last_message().is_some());
    }
}
