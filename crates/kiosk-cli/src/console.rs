//! Terminal rendering of the kiosk screen.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use kiosk_core::{Cents, InputCategory, Severity};
use kiosk_emulator::VirtualDisplay;
use kiosk_hardware::KioskDisplay;

/// How often the screen is checked for changes.
const REFRESH_INTERVAL: Duration = Duration::from_millis(100);

/// Display handed to the kiosk; writes into a shared [`VirtualDisplay`].
#[derive(Debug, Clone)]
pub struct ConsoleDisplay {
    screen: Arc<Mutex<VirtualDisplay>>,
}

impl ConsoleDisplay {
    pub fn new(screen: Arc<Mutex<VirtualDisplay>>) -> Self {
        Self { screen }
    }

    fn with<F: FnOnce(&mut VirtualDisplay)>(&mut self, f: F) {
        f(&mut lock(&self.screen));
    }
}

impl KioskDisplay for ConsoleDisplay {
    fn show_message(&mut self, text: &str, severity: Severity) {
        self.with(|d| d.show_message(text, severity));
    }

    fn show_remaining_amount(&mut self, remaining: Cents) {
        self.with(|d| d.show_remaining_amount(remaining));
    }

    fn hide_remaining_amount(&mut self) {
        self.with(|d| d.hide_remaining_amount());
    }

    fn show_inactivity_countdown(&mut self, seconds: u32) {
        self.with(|d| d.show_inactivity_countdown(seconds));
    }

    fn hide_inactivity_countdown(&mut self) {
        self.with(|d| d.hide_inactivity_countdown());
    }

    fn show_maintenance_countdown(&mut self, seconds: u32) {
        self.with(|d| d.show_maintenance_countdown(seconds));
    }

    fn show_zero_choice_prompt(&mut self, balance: Cents) {
        self.with(|d| d.show_zero_choice_prompt(balance));
    }

    fn hide_zero_choice_prompt(&mut self) {
        self.with(|d| d.hide_zero_choice_prompt());
    }

    fn show_out_of_service(&mut self) {
        self.with(|d| d.show_out_of_service());
    }

    fn set_input_enabled(&mut self, category: InputCategory, enabled: bool) {
        self.with(|d| d.set_input_enabled(category, enabled));
    }

    fn set_person_passed_button_visible(&mut self, visible: bool) {
        self.with(|d| d.set_person_passed_button_visible(visible));
    }

    fn show_drawer_balance(&mut self, balance: Cents) {
        self.with(|d| d.show_drawer_balance(balance));
    }
}

/// Print the screen whenever it changed since the last refresh.
pub async fn render_loop(screen: Arc<Mutex<VirtualDisplay>>) {
    let mut interval = tokio::time::interval(REFRESH_INTERVAL);
    let mut last_revision = None;

    loop {
        interval.tick().await;
        let frame = {
            let display = lock(&screen);
            if last_revision == Some(display.revision()) {
                continue;
            }
            last_revision = Some(display.revision());
            display.render()
        };
        println!("{frame}");
    }
}

fn lock(screen: &Mutex<VirtualDisplay>) -> MutexGuard<'_, VirtualDisplay> {
    screen.lock().unwrap_or_else(PoisonError::into_inner)
}
