//! Collaborator trait definitions.
//!
//! These traits are the outbound edge of the kiosk controller. The controller
//! calls them and never reads anything back: the screen, the gate actuator
//! and the alarm tone are driven fire-and-forget. Implementations must be
//! `Send` so the controller can live inside a tokio task.
//!
//! The traits are synchronous and object-safe, so the controller stores them
//! as `Box<dyn Trait + Send>` and tests substitute the recording mocks from
//! [`mock`](crate::mock).

use crate::error::Result;
use kiosk_core::{Cents, InputCategory, OpenReason, Severity};

/// The kiosk screen.
///
/// Every call describes a visible change; implementations decide how to
/// render it.
pub trait KioskDisplay: Send {
    /// Show the main status message.
    fn show_message(&mut self, text: &str, severity: Severity);

    /// Show the amount still owed for the current coin payment.
    fn show_remaining_amount(&mut self, remaining: Cents);

    /// Hide the amount still owed.
    fn hide_remaining_amount(&mut self);

    /// Show the coin payment inactivity countdown.
    fn show_inactivity_countdown(&mut self, seconds: u32);

    /// Hide the coin payment inactivity countdown.
    fn hide_inactivity_countdown(&mut self);

    /// Show the operator authentication countdown. Zero hides it.
    fn show_maintenance_countdown(&mut self, seconds: u32);

    /// Ask the operator whether to zero the drawer balance.
    fn show_zero_choice_prompt(&mut self, balance: Cents);

    /// Hide the zero choice prompt.
    fn hide_zero_choice_prompt(&mut self);

    /// Switch to the out-of-service screen.
    fn show_out_of_service(&mut self);

    /// Enable or disable one class of inputs.
    fn set_input_enabled(&mut self, category: InputCategory, enabled: bool);

    /// Show or hide the "person passed" button.
    fn set_person_passed_button_visible(&mut self, visible: bool);

    /// Update the maintenance panel's drawer balance.
    fn show_drawer_balance(&mut self, balance: Cents);
}

/// The gate actuator.
pub trait DoorPanel: Send {
    /// Drive the gate open.
    ///
    /// # Errors
    ///
    /// Returns an error if the actuator does not respond.
    fn open(&mut self, reason: OpenReason) -> Result<()>;

    /// Drive the gate closed.
    ///
    /// # Errors
    ///
    /// Returns an error if the actuator does not respond.
    fn close(&mut self) -> Result<()>;
}

/// Producer of the alarm tone.
pub trait Sounder: Send {
    /// Start the alarm tone.
    ///
    /// # Errors
    ///
    /// Returns an error if the tone cannot be produced.
    fn start_tone(&mut self) -> Result<()>;

    /// Stop the alarm tone.
    ///
    /// # Errors
    ///
    /// Returns an error if the tone cannot be stopped.
    fn stop_tone(&mut self) -> Result<()>;
}

/// Door panel that only exists in the controller's own state.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDoorPanel;

impl DoorPanel for NoopDoorPanel {
    fn open(&mut self, _reason: OpenReason) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Sounder that produces no sound.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSounder;

impl Sounder for SilentSounder {
    fn start_tone(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop_tone(&mut self) -> Result<()> {
        Ok(())
    }
}
