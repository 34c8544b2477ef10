//! The kiosk controller.
//!
//! [`Kiosk`] owns every component of one station entry kiosk and is the only
//! place where state entry and exit side effects happen. All entry points
//! run to completion; anything that must happen later (a processing delay,
//! a message hold, the gate auto-close, a countdown tick) is recorded as a
//! pending wake-up and fired by [`Kiosk::poll`].
//!
//! Time comes from the injected [`Clock`]. Every entry point first fires
//! whatever came due since the last call, so the order of events never
//! depends on how often the owner polls.
//!
//! # Examples
//!
//! ```
//! use kiosk_core::ManualClock;
//! use kiosk_emulator::{Kiosk, KioskState};
//! use std::time::Duration;
//!
//! let clock = ManualClock::new();
//! let mut kiosk = Kiosk::builder().with_clock(clock.clone()).build().unwrap();
//!
//! kiosk.insert_coin(100);
//! kiosk.insert_coin(20);
//! assert_eq!(kiosk.state(), KioskState::GateOpen);
//!
//! clock.advance(Duration::from_millis(16_500));
//! kiosk.poll();
//! assert_eq!(kiosk.state(), KioskState::Idle);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use kiosk_core::{
    AccessChannel, CardRejection, Cents, Clock, CoinLedger, DrawerState, Error, InputCategory,
    KioskConfig, MonotonicClock, OpenReason, Result, Severity, check_card, is_code_authorized,
};
use kiosk_hardware::{
    AlarmController, DoorPanel, DrawerEvent, DrawerSensor, KioskDisplay, NoopDoorPanel,
    SilentSounder, Sounder,
};

use crate::countdown::{CountdownEvent, CountdownTimer};
use crate::display::VirtualDisplay;
use crate::door::DoorController;
use crate::maintenance::{MaintenanceCoordinator, MaintenanceEvent, MaintenanceOperation};
use crate::scheduler::{Scheduler, TimerHandle};
use crate::state_machine::{KioskState, StateMachine, StateTransition};

const WELCOME_MESSAGE: &str = "Welcome - Choose how to enter";
const AUTH_REQUIRED_MESSAGE: &str = "Drawer open - Authentication required";

/// Data carried into the state being entered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TransitionPayload {
    #[default]
    None,
    /// Access or operator code. Required for `QrCheck` and `CardCheck`.
    Code(String),
    /// Why the gate opens. Required for `GateOpen`.
    Reason(OpenReason),
}

impl TransitionPayload {
    pub fn code(&self) -> Option<&str> {
        match self {
            TransitionPayload::Code(code) => Some(code),
            _ => None,
        }
    }

    pub fn reason(&self) -> Option<OpenReason> {
        match self {
            TransitionPayload::Reason(reason) => Some(*reason),
            _ => None,
        }
    }
}

/// Work scheduled for later.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Deferred {
    CompleteCardPayment(std::result::Result<(), CardRejection>),
    OpenGate(OpenReason),
    ReturnToIdle,
    DoorAutoClose,
    RestorePrompt,
}

/// Source of the earliest pending wake-up.
#[derive(Debug, Clone, Copy)]
enum Wake {
    Deferred,
    Inactivity,
    MaintenanceAuth,
}

/// Serializable view of the kiosk for status output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KioskSnapshot {
    pub state: KioskState,
    pub required: Cents,
    pub inserted: Cents,
    pub remaining: Cents,
    pub drawer_balance: Cents,
    pub door_open: bool,
    pub door_reason: Option<OpenReason>,
    pub drawer: DrawerState,
    pub alarm_active: bool,
    pub inactivity_remaining_secs: Option<u32>,
    pub maintenance_operation: Option<MaintenanceOperation>,
    pub pending_timers: usize,
}

/// One station entry kiosk.
pub struct Kiosk {
    config: KioskConfig,
    clock: Box<dyn Clock>,
    machine: StateMachine,
    display: Box<dyn KioskDisplay>,
    door: DoorController,
    ledger: CoinLedger,
    maintenance: MaintenanceCoordinator,
    sensor: DrawerSensor,
    drawer_events: Receiver<DrawerEvent>,
    alarm: AlarmController,
    inactivity: CountdownTimer,
    scheduler: Scheduler<Deferred>,
    /// Delays armed by the current state, cancelled when it exits.
    state_timers: Vec<TimerHandle>,
    pending_return: Option<TimerHandle>,
    card_in_flight: bool,
}

impl Kiosk {
    /// Create a builder with default collaborators.
    pub fn builder() -> KioskBuilder {
        KioskBuilder::default()
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn state(&self) -> KioskState {
        self.machine.current_state()
    }

    pub fn config(&self) -> &KioskConfig {
        &self.config
    }

    pub fn ledger(&self) -> &CoinLedger {
        &self.ledger
    }

    pub fn door(&self) -> &DoorController {
        &self.door
    }

    pub fn alarm(&self) -> &AlarmController {
        &self.alarm
    }

    pub fn maintenance(&self) -> &MaintenanceCoordinator {
        &self.maintenance
    }

    pub fn sensor(&self) -> &DrawerSensor {
        &self.sensor
    }

    /// Coin payment inactivity countdown.
    pub fn inactivity(&self) -> &CountdownTimer {
        &self.inactivity
    }

    /// Transition history, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        self.machine.history()
    }

    /// Returns `true` while a card payment is being processed.
    pub fn is_card_processing(&self) -> bool {
        self.card_in_flight
    }

    /// Capture the current state for status output.
    pub fn snapshot(&self) -> KioskSnapshot {
        KioskSnapshot {
            state: self.state(),
            required: self.ledger.required(),
            inserted: self.ledger.inserted(),
            remaining: self.ledger.remaining(),
            drawer_balance: self.ledger.drawer_balance(),
            door_open: self.door.is_open(),
            door_reason: self.door.open_reason(),
            drawer: self.sensor.state(),
            alarm_active: self.alarm.is_active(),
            inactivity_remaining_secs: self
                .inactivity
                .is_running()
                .then(|| self.inactivity.remaining_secs()),
            maintenance_operation: self.maintenance.current_operation().cloned(),
            pending_timers: self.scheduler.len(),
        }
    }

    // ------------------------------------------------------------------
    // Time
    // ------------------------------------------------------------------

    /// Earliest pending wake-up across delays and countdowns.
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.scheduler.next_deadline(),
            self.inactivity.next_wake(),
            self.maintenance.next_wake(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Fire everything due at the clock's current time.
    ///
    /// # Returns
    ///
    /// Returns the number of wake-ups processed.
    pub fn poll(&mut self) -> usize {
        let now = self.clock.now();
        self.poll_at(now)
    }

    /// Fire everything due at `now`, in deadline order.
    ///
    /// Each wake-up runs with its own deadline as the current time, so a
    /// delay armed by a firing wake-up is measured from when it was due and
    /// chained delays add up exactly.
    pub fn poll_at(&mut self, now: Instant) -> usize {
        self.dispatch_drawer_events(now);

        let mut fired = 0;
        while let Some((at, wake)) = self.next_due(now) {
            match wake {
                Wake::Deferred => {
                    if let Some((at, action)) = self.scheduler.pop_due(at) {
                        self.run_deferred(action, at);
                    }
                }
                Wake::Inactivity => {
                    if let Some(event) = self.inactivity.fire_due(at) {
                        self.on_inactivity_event(event, at);
                    }
                }
                Wake::MaintenanceAuth => {
                    if let Some(event) = self.maintenance.fire_due(at) {
                        self.on_maintenance_event(event, at);
                    }
                }
            }
            fired += 1;
        }
        fired
    }

    fn next_due(&self, now: Instant) -> Option<(Instant, Wake)> {
        [
            (self.scheduler.next_deadline(), Wake::Deferred),
            (self.inactivity.next_wake(), Wake::Inactivity),
            (self.maintenance.next_wake(), Wake::MaintenanceAuth),
        ]
        .into_iter()
        .filter_map(|(deadline, wake)| deadline.map(|at| (at, wake)))
        .filter(|(at, _)| *at <= now)
        .min_by_key(|(at, _)| *at)
    }

    /// Catch up with the clock before handling an input.
    fn catch_up(&mut self) -> Instant {
        let now = self.clock.now();
        self.poll_at(now);
        now
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Request a transition to `target`.
    ///
    /// # Returns
    ///
    /// Returns `true` if the move is in the transition table and its payload
    /// is complete. On `false` nothing changed.
    pub fn transition(&mut self, target: KioskState, payload: TransitionPayload) -> bool {
        let now = self.catch_up();
        self.transition_at(target, payload, now)
    }

    fn transition_at(&mut self, target: KioskState, payload: TransitionPayload, now: Instant) -> bool {
        let missing = match target {
            KioskState::GateOpen => payload.reason().is_none().then_some("open reason"),
            KioskState::QrCheck | KioskState::CardCheck => {
                payload.code().is_none().then_some("code")
            }
            _ => None,
        };
        if let Some(missing) = missing {
            warn!(to = %target, missing, "Transition rejected: incomplete payload");
            return false;
        }

        let from = self.state();
        if let Err(e) = self.machine.transition_to(target, now) {
            warn!(error = %e, "Transition rejected");
            return false;
        }

        info!(from = %from, to = %target, "State transition");
        self.exit_state(from, now);
        self.enter_state(target, payload, now);
        true
    }

    /// Force the kiosk back to `Idle` from any state.
    ///
    /// Silences the alarm, stops every countdown and closes the maintenance
    /// operation in progress, if any.
    pub fn reset(&mut self) {
        let now = self.catch_up();
        let from = self.state();

        self.alarm.deactivate();
        self.maintenance.stop_auth_timeout();
        if self.maintenance.current_operation().is_some() {
            self.maintenance.record(MaintenanceEvent::Reset { code: None });
            self.maintenance.finish_operation();
        }

        self.machine.reset(now);
        info!(from = %from, "Kiosk reset");
        self.exit_state(from, now);
        self.enter_state(KioskState::Idle, TransitionPayload::None, now);
    }

    fn exit_state(&mut self, state: KioskState, now: Instant) {
        for handle in self.state_timers.drain(..) {
            self.scheduler.cancel(handle);
        }
        if let Some(handle) = self.pending_return.take() {
            self.scheduler.cancel(handle);
        }

        match state {
            KioskState::CoinPayment => {
                self.inactivity.cancel();
                self.display.hide_inactivity_countdown();
                self.display.hide_remaining_amount();
            }
            KioskState::CardPayment => self.card_in_flight = false,
            KioskState::GateOpen => {
                self.door.cancel_auto_close(&mut self.scheduler);
                if self.door.is_open() {
                    self.door.close(now);
                }
                self.display.set_person_passed_button_visible(false);
            }
            KioskState::MaintAuthPending => {
                self.maintenance.stop_auth_timeout();
                self.display.show_maintenance_countdown(0);
            }
            KioskState::MaintZeroChoice => self.display.hide_zero_choice_prompt(),
            KioskState::OutOfService => {
                self.alarm.deactivate();
            }
            KioskState::Idle
            | KioskState::QrCheck
            | KioskState::CardCheck
            | KioskState::Timeout
            | KioskState::MaintAwaitingClose => {}
        }
    }

    fn enter_state(&mut self, state: KioskState, payload: TransitionPayload, now: Instant) {
        match state {
            KioskState::Idle => {
                self.ledger.reset_attempt();
                if let Some(operation) = self.maintenance.finish_operation() {
                    warn!(operation = %operation.id, "Maintenance operation closed without a decision");
                }
                self.display.hide_remaining_amount();
                self.display.hide_inactivity_countdown();
                self.display.set_person_passed_button_visible(false);
                self.display.show_message(WELCOME_MESSAGE, Severity::Info);
                self.enable_only(&InputCategory::ALL);
            }
            KioskState::CoinPayment => {
                self.enable_only(&[InputCategory::Coins, InputCategory::OpenDrawer]);
                self.display.show_message("Insert coins", Severity::Info);
                self.display.show_remaining_amount(self.ledger.remaining());
                self.arm_inactivity(now);
            }
            KioskState::CardPayment => {
                self.enable_only(&[InputCategory::CardPayment]);
                self.display
                    .show_message("Present your card to the reader", Severity::Info);
            }
            KioskState::QrCheck | KioskState::CardCheck => {
                self.enable_only(&[]);
                let (channel, reason) = if state == KioskState::QrCheck {
                    (AccessChannel::Qr, OpenReason::Qr)
                } else {
                    (AccessChannel::ContactlessCard, OpenReason::CardAuthorized)
                };
                let code = payload.code().unwrap_or_default();
                if self.authorize(channel, code) {
                    self.display.show_message("Access granted", Severity::Success);
                    self.schedule_state_timer(
                        now,
                        self.config.success_hold(),
                        Deferred::OpenGate(reason),
                    );
                } else {
                    self.display.show_message("Access denied", Severity::Error);
                    self.schedule_return_to_idle(now, self.config.error_hold());
                }
            }
            KioskState::GateOpen => {
                let Some(reason) = payload.reason() else {
                    error!("GateOpen entered without an open reason");
                    return;
                };
                self.inactivity.cancel();
                self.enable_only(&[InputCategory::OpenDrawer]);
                self.door.open(reason, now);
                self.door.schedule_auto_close(
                    &mut self.scheduler,
                    now,
                    self.config.door_auto_close(),
                    Deferred::DoorAutoClose,
                );
                self.display
                    .show_message("Access granted - Door open", Severity::Success);
                self.display.set_person_passed_button_visible(true);
            }
            KioskState::Timeout => {
                self.enable_only(&[]);
                self.display
                    .show_message("Timeout - Operation cancelled", Severity::Warning);
                self.schedule_return_to_idle(now, self.config.timeout_return());
            }
            KioskState::MaintAuthPending => {
                self.enable_only(&[InputCategory::ContactlessCard]);
                self.maintenance.begin_operation();
                self.display
                    .show_message(AUTH_REQUIRED_MESSAGE, Severity::Warning);
                self.display.show_drawer_balance(self.ledger.drawer_balance());
                if let CountdownEvent::Tick(seconds) = self.maintenance.arm_auth_timeout(now) {
                    self.display.show_maintenance_countdown(seconds);
                }
            }
            KioskState::MaintAwaitingClose => {
                self.enable_only(&[InputCategory::CloseDrawer]);
                let message = match payload.code() {
                    Some(code) => {
                        format!("Operator authorized ({code}) - Waiting for drawer to close")
                    }
                    None => "Operator authorized - Waiting for drawer to close".to_string(),
                };
                self.display.show_message(&message, Severity::Success);
            }
            KioskState::MaintZeroChoice => {
                self.enable_only(&[]);
                let balance = self.ledger.drawer_balance();
                self.display.show_drawer_balance(balance);
                self.display.show_zero_choice_prompt(balance);
            }
            KioskState::OutOfService => {
                self.alarm.activate();
                self.enable_only(&[InputCategory::ContactlessCard]);
                self.maintenance.record(MaintenanceEvent::OutOfService);
                self.display.show_out_of_service();
                error!("Kiosk out of service until an operator resets it");
            }
        }
    }

    // ------------------------------------------------------------------
    // Coins
    // ------------------------------------------------------------------

    /// Insert a coin worth `cents`.
    ///
    /// From `Idle` this starts a coin payment. Rejected denominations leave
    /// the ledger untouched and show a warning.
    ///
    /// # Returns
    ///
    /// Returns `true` if the coin was accepted.
    pub fn insert_coin(&mut self, cents: u32) -> bool {
        let now = self.catch_up();
        let coin = Cents::new(cents);

        match self.state() {
            KioskState::Idle => {
                if !self.transition_at(KioskState::CoinPayment, TransitionPayload::None, now) {
                    return false;
                }
            }
            KioskState::CoinPayment => {}
            _ => return self.refuse("insert_coin"),
        }

        if !self.ledger.insert(coin) {
            self.display
                .show_message(&format!("Coin not accepted: {coin}"), Severity::Warning);
            return false;
        }

        self.display.show_drawer_balance(self.ledger.drawer_balance());
        if self.ledger.is_complete() {
            info!(
                inserted = self.ledger.inserted().as_u32(),
                coins = self.ledger.inserted_coins().len(),
                "Coin payment complete"
            );
            self.transition_at(
                KioskState::GateOpen,
                TransitionPayload::Reason(OpenReason::Coins),
                now,
            );
        } else {
            self.display.show_remaining_amount(self.ledger.remaining());
            self.arm_inactivity(now);
        }
        true
    }

    fn arm_inactivity(&mut self, now: Instant) {
        if let CountdownEvent::Tick(seconds) =
            self.inactivity.start(self.config.inactivity_timeout_secs, now)
        {
            self.display.show_inactivity_countdown(seconds);
        }
    }

    fn on_inactivity_event(&mut self, event: CountdownEvent, now: Instant) {
        match event {
            CountdownEvent::Tick(seconds) => self.display.show_inactivity_countdown(seconds),
            CountdownEvent::Expired => {
                info!(
                    inserted = self.ledger.inserted().as_u32(),
                    "Coin payment abandoned"
                );
                self.transition_at(KioskState::Timeout, TransitionPayload::None, now);
            }
        }
    }

    // ------------------------------------------------------------------
    // Card payment
    // ------------------------------------------------------------------

    /// Switch to card payment. Calling it again while paying by card is a
    /// no-op that succeeds.
    pub fn start_card_payment(&mut self) -> bool {
        let now = self.catch_up();
        match self.state() {
            KioskState::Idle => {
                self.transition_at(KioskState::CardPayment, TransitionPayload::None, now)
            }
            KioskState::CardPayment => true,
            _ => self.refuse("start_card_payment"),
        }
    }

    /// Submit a payment card number.
    ///
    /// The verdict is shown after the processing delay. An accepted card
    /// opens the gate after the success hold; a declined card returns to
    /// `Idle` after the error hold.
    ///
    /// # Returns
    ///
    /// Returns `true` if the number was taken for processing.
    pub fn submit_card_number(&mut self, number: &str) -> bool {
        let now = self.catch_up();
        if self.state() != KioskState::CardPayment {
            return self.refuse("submit_card_number");
        }
        if self.card_in_flight {
            warn!("Card number refused: a payment is already processing");
            return false;
        }

        let verdict = check_card(number);
        info!(length = number.chars().count(), "Card submitted");
        self.card_in_flight = true;
        self.display.show_message("Processing...", Severity::Info);
        self.schedule_state_timer(
            now,
            self.config.card_processing(),
            Deferred::CompleteCardPayment(verdict),
        );
        true
    }

    fn complete_card_payment(
        &mut self,
        verdict: std::result::Result<(), CardRejection>,
        now: Instant,
    ) {
        self.card_in_flight = false;
        match verdict {
            Ok(()) => {
                info!("Card payment accepted");
                self.display.show_message("Payment accepted", Severity::Success);
                self.schedule_state_timer(
                    now,
                    self.config.success_hold(),
                    Deferred::OpenGate(OpenReason::Card),
                );
            }
            Err(rejection) => {
                info!(error = %Error::CardRejected(rejection), "Card payment declined");
                self.display
                    .show_message("Payment declined - Try again", Severity::Error);
                self.schedule_return_to_idle(now, self.config.error_hold());
            }
        }
    }

    // ------------------------------------------------------------------
    // Codes
    // ------------------------------------------------------------------

    /// Log an action the current state does not allow.
    fn refuse(&self, action: &str) -> bool {
        warn!(error = %Error::action_not_allowed(action, self.state()), "Action refused");
        false
    }

    fn authorize(&self, channel: AccessChannel, code: &str) -> bool {
        let authorized = is_code_authorized(code);
        if authorized {
            info!(channel = %channel, code, "Code authorized");
        } else {
            warn!(
                channel = %channel,
                error = %Error::CodeNotAuthorized(code.to_string()),
                "Code refused"
            );
        }
        authorized
    }

    /// Check a scanned QR code. Only valid in `Idle`.
    ///
    /// # Returns
    ///
    /// Returns `true` if the check started; the verdict is shown on screen.
    pub fn verify_qr(&mut self, code: &str) -> bool {
        let now = self.catch_up();
        if self.state() != KioskState::Idle {
            return self.refuse("verify_qr");
        }
        self.transition_at(
            KioskState::QrCheck,
            TransitionPayload::Code(code.to_string()),
            now,
        )
    }

    /// Handle a contactless card tap.
    ///
    /// In `Idle` the code grants visitor access. During maintenance it is an
    /// operator code, see [`submit_maintenance_code`](Self::submit_maintenance_code).
    pub fn verify_card(&mut self, code: &str) -> bool {
        let now = self.catch_up();
        match self.state() {
            KioskState::Idle => self.transition_at(
                KioskState::CardCheck,
                TransitionPayload::Code(code.to_string()),
                now,
            ),
            KioskState::MaintAuthPending | KioskState::OutOfService => {
                self.operator_code(code, now)
            }
            _ => self.refuse("verify_card"),
        }
    }

    /// Submit an operator code.
    ///
    /// In `MaintAuthPending` a valid code authenticates the operator. In
    /// `OutOfService` it restores the kiosk. A wrong code shows "access
    /// denied" and the prompt comes back after the error hold.
    ///
    /// # Returns
    ///
    /// Returns `true` if the code was accepted.
    pub fn submit_maintenance_code(&mut self, code: &str) -> bool {
        let now = self.catch_up();
        self.operator_code(code, now)
    }

    fn operator_code(&mut self, code: &str, now: Instant) -> bool {
        match self.state() {
            KioskState::MaintAuthPending => {
                if !self.authorize(AccessChannel::Operator, code) {
                    self.deny_operator(code, now);
                    return false;
                }
                self.maintenance.record(MaintenanceEvent::AuthSuccess {
                    code: code.to_string(),
                });
                self.transition_at(
                    KioskState::MaintAwaitingClose,
                    TransitionPayload::Code(code.to_string()),
                    now,
                )
            }
            KioskState::OutOfService => {
                if self.pending_return.is_some() {
                    debug!("Reset already in progress");
                    return true;
                }
                if !self.authorize(AccessChannel::Operator, code) {
                    self.deny_operator(code, now);
                    return false;
                }
                self.maintenance.record(MaintenanceEvent::Reset {
                    code: Some(code.to_string()),
                });
                self.maintenance.finish_operation();
                self.alarm.deactivate();
                self.display.show_message(
                    &format!("System restored by operator ({code})"),
                    Severity::Success,
                );
                self.schedule_return_to_idle(now, self.config.maintenance_return());
                true
            }
            _ => self.refuse("submit_maintenance_code"),
        }
    }

    fn deny_operator(&mut self, code: &str, now: Instant) {
        if self.state() == KioskState::MaintAuthPending {
            self.maintenance.record(MaintenanceEvent::AuthFail {
                code: code.to_string(),
            });
        }
        self.display
            .show_message(&format!("Access denied ({code})"), Severity::Error);
        self.schedule_state_timer(now, self.config.error_hold(), Deferred::RestorePrompt);
    }

    fn restore_prompt(&mut self) {
        match self.state() {
            KioskState::MaintAuthPending => self
                .display
                .show_message(AUTH_REQUIRED_MESSAGE, Severity::Warning),
            KioskState::OutOfService => self.display.show_out_of_service(),
            state => debug!(state = %state, "No prompt to restore"),
        }
    }

    fn on_maintenance_event(&mut self, event: CountdownEvent, now: Instant) {
        match event {
            CountdownEvent::Tick(seconds) => self.display.show_maintenance_countdown(seconds),
            CountdownEvent::Expired => {
                self.maintenance.record(MaintenanceEvent::Timeout);
                self.transition_at(KioskState::OutOfService, TransitionPayload::None, now);
            }
        }
    }

    // ------------------------------------------------------------------
    // Gate
    // ------------------------------------------------------------------

    /// The visitor went through the gate.
    ///
    /// Closes the gate at once, cancelling the auto-close, and returns to
    /// `Idle` after the settle delay.
    pub fn on_person_passed(&mut self) -> bool {
        let now = self.catch_up();
        if self.state() != KioskState::GateOpen || !self.door.is_open() {
            warn!(
                state = %self.state(),
                door_open = self.door.is_open(),
                "Person passed ignored"
            );
            return false;
        }

        self.door.close_manual(&mut self.scheduler, now);
        self.display.set_person_passed_button_visible(false);
        self.display
            .show_message("Person passed - Door closing", Severity::Info);
        self.schedule_return_to_idle(now, self.config.door_settle());
        true
    }

    fn door_auto_close(&mut self, now: Instant) {
        if self.door.close(now).is_some() {
            info!("Door closed automatically");
        }
        self.display.set_person_passed_button_visible(false);
        self.schedule_return_to_idle(now, self.config.door_settle());
    }

    // ------------------------------------------------------------------
    // Cash drawer
    // ------------------------------------------------------------------

    /// "Open drawer" button: notifies the sensor and reacts to its event.
    pub fn open_drawer(&mut self) -> bool {
        let now = self.catch_up();
        self.sensor.notify_opened();
        self.dispatch_drawer_events(now)
    }

    /// "Close drawer" button: notifies the sensor and reacts to its event.
    pub fn close_drawer(&mut self) -> bool {
        let now = self.catch_up();
        self.sensor.notify_closed();
        self.dispatch_drawer_events(now)
    }

    /// Handle every sensor event received through the subscription.
    ///
    /// Returns `true` if any of them changed the kiosk state.
    fn dispatch_drawer_events(&mut self, now: Instant) -> bool {
        let mut handled = false;
        while let Ok(event) = self.drawer_events.try_recv() {
            handled |= match event.new {
                DrawerState::Open => self.on_drawer_opened(now),
                DrawerState::Closed => self.on_drawer_closed(now),
            };
        }
        handled
    }

    fn on_drawer_opened(&mut self, now: Instant) -> bool {
        match self.state() {
            KioskState::Idle | KioskState::GateOpen => {
                self.transition_at(KioskState::MaintAuthPending, TransitionPayload::None, now)
            }
            KioskState::CoinPayment => {
                info!(
                    inserted = self.ledger.inserted().as_u32(),
                    "Coin payment aborted: drawer opened"
                );
                self.ledger.reset_attempt();
                self.transition_at(KioskState::MaintAuthPending, TransitionPayload::None, now)
            }
            _ => self.refuse("open_drawer"),
        }
    }

    fn on_drawer_closed(&mut self, now: Instant) -> bool {
        if self.state() != KioskState::MaintAwaitingClose {
            debug!(state = %self.state(), "Drawer closed: ignored in this state");
            return false;
        }
        self.maintenance.record(MaintenanceEvent::Closed);
        self.transition_at(KioskState::MaintZeroChoice, TransitionPayload::None, now)
    }

    /// Resolve the zeroing prompt.
    ///
    /// # Returns
    ///
    /// Returns `true` if a decision was pending.
    pub fn confirm_zero(&mut self, zero: bool) -> bool {
        let now = self.catch_up();
        if self.state() != KioskState::MaintZeroChoice
            || self.maintenance.current_operation().is_none()
        {
            return self.refuse("confirm_zero");
        }

        let balance_before = self.ledger.drawer_balance();
        if zero {
            self.ledger.zero_drawer();
        }
        let balance_after = self.ledger.drawer_balance();

        self.maintenance.record(MaintenanceEvent::ZeroDecision {
            zeroed: zero,
            balance_before,
            balance_after,
        });
        if let Some(operation) = self.maintenance.finish_operation() {
            debug!(operation = %operation.id, "Maintenance operation complete");
        }

        self.display.hide_zero_choice_prompt();
        self.display.show_drawer_balance(balance_after);
        if zero {
            self.display.show_message(
                &format!("Balance zeroed: {balance_before}"),
                Severity::Success,
            );
        } else {
            self.display
                .show_message(&format!("Balance kept: {balance_after}"), Severity::Info);
        }
        self.schedule_return_to_idle(now, self.config.maintenance_return());
        true
    }

    // ------------------------------------------------------------------
    // Scheduling helpers
    // ------------------------------------------------------------------

    fn schedule_state_timer(&mut self, now: Instant, delay: Duration, action: Deferred) {
        let handle = self.scheduler.schedule(now, delay, action);
        self.state_timers.push(handle);
    }

    /// Schedule the return to `Idle`, unless one is already pending.
    fn schedule_return_to_idle(&mut self, now: Instant, delay: Duration) {
        if self
            .pending_return
            .is_some_and(|handle| self.scheduler.is_pending(handle))
        {
            debug!("Return to idle already scheduled");
            return;
        }
        let handle = self.scheduler.schedule(now, delay, Deferred::ReturnToIdle);
        debug!(delay_ms = delay.as_millis() as u64, timer = %handle, "Return to idle scheduled");
        self.pending_return = Some(handle);
    }

    fn run_deferred(&mut self, action: Deferred, now: Instant) {
        match action {
            Deferred::CompleteCardPayment(verdict) => self.complete_card_payment(verdict, now),
            Deferred::OpenGate(reason) => {
                self.transition_at(
                    KioskState::GateOpen,
                    TransitionPayload::Reason(reason),
                    now,
                );
            }
            Deferred::ReturnToIdle => {
                self.pending_return = None;
                self.transition_at(KioskState::Idle, TransitionPayload::None, now);
            }
            Deferred::DoorAutoClose => self.door_auto_close(now),
            Deferred::RestorePrompt => self.restore_prompt(),
        }
    }

    fn enable_only(&mut self, enabled: &[InputCategory]) {
        for category in InputCategory::ALL {
            self.display
                .set_input_enabled(category, enabled.contains(&category));
        }
    }
}

impl fmt::Debug for Kiosk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kiosk")
            .field("state", &self.state())
            .field("ledger", &self.ledger)
            .field("door", &self.door)
            .field("alarm", &self.alarm)
            .field("pending_timers", &self.scheduler.len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Kiosk`].
///
/// Every collaborator has a default: a monotonic clock, an in-memory
/// [`VirtualDisplay`], a door panel and a sounder that do nothing.
pub struct KioskBuilder {
    config: KioskConfig,
    clock: Box<dyn Clock>,
    display: Box<dyn KioskDisplay>,
    door_panel: Box<dyn DoorPanel>,
    sounder: Box<dyn Sounder>,
}

impl KioskBuilder {
    pub fn with_config(mut self, config: KioskConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_display(mut self, display: impl KioskDisplay + 'static) -> Self {
        self.display = Box::new(display);
        self
    }

    pub fn with_door_panel(mut self, panel: impl DoorPanel + 'static) -> Self {
        self.door_panel = Box::new(panel);
        self
    }

    pub fn with_sounder(mut self, sounder: impl Sounder + 'static) -> Self {
        self.sounder = Box::new(sounder);
        self
    }

    /// Build the kiosk and show the welcome screen.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if the configuration does not validate.
    pub fn build(self) -> Result<Kiosk> {
        self.config.validate()?;

        let now = self.clock.now();
        let ledger = CoinLedger::with_required_amount(self.config.required_amount())
            .with_denominations(self.config.accepted_denominations());
        let maintenance =
            MaintenanceCoordinator::with_auth_timeout(self.config.maintenance_auth_timeout_secs);

        let (tx, drawer_events) = mpsc::channel();
        let mut sensor = DrawerSensor::new();
        sensor.subscribe(move |event: &DrawerEvent| {
            // The receiver lives as long as the kiosk
            let _ = tx.send(event.clone());
        });

        let mut kiosk = Kiosk {
            config: self.config,
            clock: self.clock,
            machine: StateMachine::new(now),
            display: self.display,
            door: DoorController::new(self.door_panel),
            ledger,
            maintenance,
            sensor,
            drawer_events,
            alarm: AlarmController::new(self.sounder),
            inactivity: CountdownTimer::new(),
            scheduler: Scheduler::new(),
            state_timers: Vec::new(),
            pending_return: None,
            card_in_flight: false,
        };
        kiosk.enter_state(KioskState::Idle, TransitionPayload::None, now);
        info!(
            required = %kiosk.ledger.required(),
            "Kiosk ready"
        );
        Ok(kiosk)
    }
}

impl Default for KioskBuilder {
    fn default() -> Self {
        Self {
            config: KioskConfig::default(),
            clock: Box::new(MonotonicClock),
            display: Box::new(VirtualDisplay::new()),
            door_panel: Box::new(NoopDoorPanel),
            sounder: Box::new(SilentSounder),
        }
    }
}
