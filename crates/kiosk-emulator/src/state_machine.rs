//! Kiosk state machine.
//!
//! This module holds the kiosk's single current state, the static transition
//! table and a bounded history of transitions. It only validates and records
//! transitions; the side effects of entering and leaving a state live in
//! [`Kiosk`](crate::Kiosk).
//!
//! # States
//!
//! - `Idle`: welcome screen, every input enabled
//! - `CoinPayment`: collecting coins, inactivity countdown armed
//! - `CardPayment`: waiting for / processing a payment card
//! - `QrCheck`, `CardCheck`: checking a visitor's access code
//! - `GateOpen`: gate open, waiting for the visitor to pass
//! - `Timeout`: coin payment abandoned
//! - `MaintAuthPending`: drawer open, operator must authenticate
//! - `MaintAwaitingClose`: operator authenticated, drawer still open
//! - `MaintZeroChoice`: drawer closed, operator decides whether to zero it
//! - `OutOfService`: authentication window missed, alarm sounding
//!
//! # Valid Transitions
//!
//! - Idle → CoinPayment | CardPayment | QrCheck | CardCheck | GateOpen | MaintAuthPending
//! - CoinPayment → GateOpen | Timeout | Idle | MaintAuthPending
//! - CardPayment | QrCheck | CardCheck → GateOpen | Idle
//! - GateOpen → Idle | MaintAuthPending
//! - Timeout → Idle
//! - MaintAuthPending → MaintAwaitingClose | OutOfService | Idle
//! - MaintAwaitingClose → MaintZeroChoice | OutOfService
//! - MaintZeroChoice → Idle
//! - OutOfService → Idle
//!
//! [`StateMachine::reset`] bypasses the table and forces `Idle`.
//!
//! # Examples
//!
//! ```
//! use kiosk_emulator::{KioskState, StateMachine};
//! use std::time::Instant;
//!
//! let now = Instant::now();
//! let mut machine = StateMachine::new(now);
//! assert_eq!(machine.current_state(), KioskState::Idle);
//!
//! machine.transition_to(KioskState::CoinPayment, now).unwrap();
//! assert!(machine.transition_to(KioskState::MaintZeroChoice, now).is_err());
//! assert_eq!(machine.current_state(), KioskState::CoinPayment);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use kiosk_core::constants::MAX_HISTORY_SIZE;
use kiosk_core::{Error, Result};

/// Every state the kiosk can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KioskState {
    /// Waiting for a visitor.
    Idle,

    /// Collecting coins for a ticket.
    CoinPayment,

    /// Waiting for or processing a payment card.
    CardPayment,

    /// Checking a scanned QR code.
    QrCheck,

    /// Checking a tapped contactless card code.
    CardCheck,

    /// Gate open for one visitor.
    GateOpen,

    /// Coin payment abandoned for too long.
    Timeout,

    /// Cash drawer opened, waiting for operator authentication.
    MaintAuthPending,

    /// Operator authenticated, waiting for the drawer to close.
    MaintAwaitingClose,

    /// Drawer closed, waiting for the zeroing decision.
    MaintZeroChoice,

    /// Authentication window missed; alarm sounding until reset.
    OutOfService,
}

impl KioskState {
    /// Every state, in declaration order.
    pub const ALL: [KioskState; 11] = [
        KioskState::Idle,
        KioskState::CoinPayment,
        KioskState::CardPayment,
        KioskState::QrCheck,
        KioskState::CardCheck,
        KioskState::GateOpen,
        KioskState::Timeout,
        KioskState::MaintAuthPending,
        KioskState::MaintAwaitingClose,
        KioskState::MaintZeroChoice,
        KioskState::OutOfService,
    ];

    /// Check if transition to target state is valid from this state.
    ///
    /// # Arguments
    ///
    /// * `target` - The target state to transition to
    ///
    /// # Returns
    ///
    /// Returns `true` if the transition is in the table, `false` otherwise.
    ///
    /// # Examples
    ///
    /// ```
    /// use kiosk_emulator::KioskState;
    ///
    /// assert!(KioskState::Idle.can_transition_to(KioskState::QrCheck));
    /// assert!(!KioskState::Timeout.can_transition_to(KioskState::GateOpen));
    /// ```
    pub fn can_transition_to(self, target: KioskState) -> bool {
        use KioskState::*;

        matches!(
            (self, target),
            // From Idle
            (Idle, CoinPayment | CardPayment | QrCheck | CardCheck | GateOpen | MaintAuthPending)
            // From CoinPayment
            | (CoinPayment, GateOpen | Timeout | Idle | MaintAuthPending)
            // From card payment and code checks
            | (CardPayment | QrCheck | CardCheck, GateOpen | Idle)
            // From GateOpen
            | (GateOpen, Idle | MaintAuthPending)
            // From Timeout
            | (Timeout, Idle)
            // Maintenance flow
            | (MaintAuthPending, MaintAwaitingClose | OutOfService | Idle)
            | (MaintAwaitingClose, MaintZeroChoice | OutOfService)
            | (MaintZeroChoice, Idle)
            | (OutOfService, Idle)
        )
    }

    /// States directly reachable from this one.
    pub fn successors(self) -> Vec<KioskState> {
        KioskState::ALL
            .into_iter()
            .filter(|target| self.can_transition_to(*target))
            .collect()
    }

    /// Returns `true` for the states of the maintenance flow.
    pub fn is_maintenance(self) -> bool {
        matches!(
            self,
            KioskState::MaintAuthPending
                | KioskState::MaintAwaitingClose
                | KioskState::MaintZeroChoice
                | KioskState::OutOfService
        )
    }
}

impl fmt::Display for KioskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            KioskState::Idle => "Idle",
            KioskState::CoinPayment => "CoinPayment",
            KioskState::CardPayment => "CardPayment",
            KioskState::QrCheck => "QrCheck",
            KioskState::CardCheck => "CardCheck",
            KioskState::GateOpen => "GateOpen",
            KioskState::Timeout => "Timeout",
            KioskState::MaintAuthPending => "MaintAuthPending",
            KioskState::MaintAwaitingClose => "MaintAwaitingClose",
            KioskState::MaintZeroChoice => "MaintZeroChoice",
            KioskState::OutOfService => "OutOfService",
        };
        write!(f, "{}", state_str)
    }
}

/// Represents a single state transition with timestamp.
///
/// # Serialization Note
///
/// The `timestamp` field is not serialized as `Instant` is process-specific.
/// When deserializing, the timestamp will be set to the current time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    /// The state transitioned from.
    pub from: KioskState,

    /// The state transitioned to.
    pub to: KioskState,

    /// `true` if the transition bypassed the table (reset).
    pub forced: bool,

    /// When the transition occurred.
    #[serde(skip, default = "Instant::now")]
    pub timestamp: Instant,
}

impl StateTransition {
    /// Create a new state transition record.
    pub fn new(from: KioskState, to: KioskState, at: Instant) -> Self {
        Self {
            from,
            to,
            forced: false,
            timestamp: at,
        }
    }

    fn forced(from: KioskState, to: KioskState, at: Instant) -> Self {
        Self {
            forced: true,
            ..Self::new(from, to, at)
        }
    }
}

/// Validating state holder with bounded history.
///
/// # Thread Safety
///
/// Not synchronized. The kiosk controller owns it
/// and mutates it from a single event-handling context.
///
/// # Examples
///
/// ```
/// use kiosk_emulator::{KioskState, StateMachine};
/// use std::time::Instant;
///
/// let now = Instant::now();
/// let mut machine = StateMachine::new(now);
///
/// machine.transition_to(KioskState::QrCheck, now).unwrap();
/// machine.transition_to(KioskState::GateOpen, now).unwrap();
/// machine.transition_to(KioskState::Idle, now).unwrap();
///
/// assert_eq!(machine.history().len(), 3);
/// ```
#[derive(Debug)]
pub struct StateMachine {
    /// Current state of the kiosk.
    current_state: KioskState,

    /// When the current state was entered.
    state_entered_at: Instant,

    /// History of state transitions (limited to MAX_HISTORY_SIZE).
    history: VecDeque<StateTransition>,
}

impl StateMachine {
    /// Create a new state machine in the Idle state.
    pub fn new(now: Instant) -> Self {
        Self::builder().build(now)
    }

    /// Create a builder for constructing a state machine with custom configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use kiosk_emulator::{KioskState, StateMachine};
    /// use std::time::Instant;
    ///
    /// let machine = StateMachine::builder()
    ///     .with_initial_state(KioskState::OutOfService)
    ///     .build(Instant::now());
    ///
    /// assert_eq!(machine.current_state(), KioskState::OutOfService);
    /// ```
    pub fn builder() -> StateMachineBuilder {
        StateMachineBuilder::default()
    }

    /// Get the current state of the machine.
    pub fn current_state(&self) -> KioskState {
        self.current_state
    }

    /// When the current state was entered.
    pub fn state_entered_at(&self) -> Instant {
        self.state_entered_at
    }

    /// Time spent in the current state as of `now`.
    pub fn time_in_current_state(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.state_entered_at)
    }

    /// Get a reference to the state transition history, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// Get the last N state transitions.
    ///
    /// # Arguments
    ///
    /// * `count` - Maximum number of transitions to return
    ///
    /// # Returns
    ///
    /// Returns a vector of the most recent transitions, up to `count`.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        self.history
            .iter()
            .rev()
            .take(count)
            .rev()
            .cloned()
            .collect()
    }

    /// Transition to a new state, validating it against the table.
    ///
    /// # Arguments
    ///
    /// * `new_state` - The target state to transition to
    /// * `at` - When the transition happens
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` if the table does not allow
    /// the move. The current state is left untouched.
    pub fn transition_to(&mut self, new_state: KioskState, at: Instant) -> Result<StateTransition> {
        if !self.current_state.can_transition_to(new_state) {
            return Err(Error::InvalidStateTransition {
                from: self.current_state.to_string(),
                to: new_state.to_string(),
            });
        }

        let transition = StateTransition::new(self.current_state, new_state, at);
        self.perform_state_change(transition.clone());
        Ok(transition)
    }

    /// Force the machine back to Idle regardless of the current state.
    pub fn reset(&mut self, at: Instant) -> StateTransition {
        let transition = StateTransition::forced(self.current_state, KioskState::Idle, at);
        self.perform_state_change(transition.clone());
        transition
    }

    fn perform_state_change(&mut self, transition: StateTransition) {
        self.current_state = transition.to;
        self.state_entered_at = transition.timestamp;

        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
    }
}

/// Builder for constructing `StateMachine` instances with custom configuration.
#[derive(Debug)]
pub struct StateMachineBuilder {
    initial_state: KioskState,
    history: VecDeque<StateTransition>,
}

impl StateMachineBuilder {
    /// Set the initial state for the machine.
    pub fn with_initial_state(mut self, state: KioskState) -> Self {
        self.initial_state = state;
        self
    }

    /// Set pre-populated history for the machine.
    pub fn with_history(mut self, history: VecDeque<StateTransition>) -> Self {
        self.history = history;
        self
    }

    /// Build the state machine, entering the initial state at `now`.
    pub fn build(self, now: Instant) -> StateMachine {
        StateMachine {
            current_state: self.initial_state,
            state_entered_at: now,
            history: self.history,
        }
    }
}

impl Default for StateMachineBuilder {
    fn default() -> Self {
        Self {
            initial_state: KioskState::Idle,
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use KioskState::*;

    fn machine_in(state: KioskState) -> StateMachine {
        StateMachine::builder()
            .with_initial_state(state)
            .build(Instant::now())
    }

    #[test]
    fn test_new_machine_starts_idle() {
        let machine = StateMachine::new(Instant::now());
        assert_eq!(machine.current_state(), Idle);
        assert_eq!(machine.history().len(), 0);
    }

    #[rstest]
    #[case(Idle, CoinPayment)]
    #[case(Idle, CardPayment)]
    #[case(Idle, QrCheck)]
    #[case(Idle, CardCheck)]
    #[case(Idle, GateOpen)]
    #[case(Idle, MaintAuthPending)]
    #[case(CoinPayment, GateOpen)]
    #[case(CoinPayment, Timeout)]
    #[case(CoinPayment, Idle)]
    #[case(CoinPayment, MaintAuthPending)]
    #[case(CardPayment, GateOpen)]
    #[case(CardPayment, Idle)]
    #[case(QrCheck, GateOpen)]
    #[case(QrCheck, Idle)]
    #[case(CardCheck, GateOpen)]
    #[case(CardCheck, Idle)]
    #[case(GateOpen, Idle)]
    #[case(GateOpen, MaintAuthPending)]
    #[case(Timeout, Idle)]
    #[case(MaintAuthPending, MaintAwaitingClose)]
    #[case(MaintAuthPending, OutOfService)]
    #[case(MaintAuthPending, Idle)]
    #[case(MaintAwaitingClose, MaintZeroChoice)]
    #[case(MaintAwaitingClose, OutOfService)]
    #[case(MaintZeroChoice, Idle)]
    #[case(OutOfService, Idle)]
    fn test_valid_transitions(#[case] from: KioskState, #[case] to: KioskState) {
        let mut machine = machine_in(from);
        let transition = machine.transition_to(to, Instant::now()).unwrap();

        assert_eq!(transition.from, from);
        assert_eq!(transition.to, to);
        assert!(!transition.forced);
        assert_eq!(machine.current_state(), to);
    }

    #[rstest]
    #[case(Idle, Idle)]
    #[case(Idle, Timeout)]
    #[case(Idle, OutOfService)]
    #[case(CoinPayment, CardPayment)]
    #[case(CardPayment, MaintAuthPending)]
    #[case(QrCheck, CardCheck)]
    #[case(GateOpen, Timeout)]
    #[case(Timeout, GateOpen)]
    #[case(MaintAuthPending, MaintZeroChoice)]
    #[case(MaintAwaitingClose, Idle)]
    #[case(MaintZeroChoice, OutOfService)]
    #[case(OutOfService, MaintAuthPending)]
    fn test_invalid_transitions_leave_state_unchanged(
        #[case] from: KioskState,
        #[case] to: KioskState,
    ) {
        let mut machine = machine_in(from);
        let result = machine.transition_to(to, Instant::now());

        assert!(matches!(result, Err(Error::InvalidStateTransition { .. })));
        assert_eq!(machine.current_state(), from);
        assert!(machine.history().is_empty());
    }

    #[test]
    fn test_transition_table_is_exhaustive() {
        let edges: usize = KioskState::ALL.iter().map(|s| s.successors().len()).sum();
        assert_eq!(edges, 26);
    }

    #[test]
    fn test_every_state_can_reach_idle() {
        for state in KioskState::ALL {
            let mut current = state;
            for _ in 0..KioskState::ALL.len() {
                if current == Idle {
                    break;
                }
                current = if current.can_transition_to(Idle) {
                    Idle
                } else {
                    current.successors()[0]
                };
            }
            assert_eq!(current, Idle, "{state} cannot reach Idle");
        }
    }

    #[test]
    fn test_reset_is_forced_from_any_state() {
        for state in KioskState::ALL {
            let mut machine = machine_in(state);
            let transition = machine.reset(Instant::now());

            assert_eq!(machine.current_state(), Idle);
            assert_eq!(transition.from, state);
            assert!(transition.forced);
        }
    }

    #[test]
    fn test_time_in_current_state() {
        let start = Instant::now();
        let mut machine = StateMachine::new(start);
        let entered = start + Duration::from_secs(2);

        machine.transition_to(QrCheck, entered).unwrap();

        assert_eq!(machine.state_entered_at(), entered);
        assert_eq!(
            machine.time_in_current_state(entered + Duration::from_millis(500)),
            Duration::from_millis(500)
        );
    }

    #[test]
    fn test_last_transitions_returns_most_recent() {
        let now = Instant::now();
        let mut machine = StateMachine::new(now);
        machine.transition_to(CoinPayment, now).unwrap();
        machine.transition_to(Timeout, now).unwrap();
        machine.transition_to(Idle, now).unwrap();

        let last = machine.last_transitions(2);
        assert_eq!(last.len(), 2);
        assert_eq!(last[0].to, Timeout);
        assert_eq!(last[1].to, Idle);
    }

    #[test]
    fn test_history_size_limit() {
        let now = Instant::now();
        let mut machine = StateMachine::new(now);

        for _ in 0..(MAX_HISTORY_SIZE + 10) {
            machine.transition_to(QrCheck, now).unwrap();
            machine.transition_to(Idle, now).unwrap();
        }

        assert_eq!(machine.history().len(), MAX_HISTORY_SIZE);
    }

    #[test]
    fn test_builder_with_history() {
        let now = Instant::now();
        let mut history = VecDeque::new();
        history.push_back(StateTransition::new(Idle, CoinPayment, now));

        let machine = StateMachine::builder()
            .with_initial_state(CoinPayment)
            .with_history(history)
            .build(now);

        assert_eq!(machine.history().len(), 1);
        assert_eq!(machine.current_state(), CoinPayment);
    }

    #[test]
    fn test_maintenance_states() {
        let maintenance: Vec<_> = KioskState::ALL
            .into_iter()
            .filter(|s| s.is_maintenance())
            .collect();
        assert_eq!(
            maintenance,
            vec![MaintAuthPending, MaintAwaitingClose, MaintZeroChoice, OutOfService]
        );
    }

    #[test]
    fn test_state_serialization() {
        let serialized = serde_json::to_string(&MaintAuthPending).unwrap();
        assert_eq!(serialized, "\"maint_auth_pending\"");

        let deserialized: KioskState = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, MaintAuthPending);
    }

    #[test]
    fn test_transition_serialization() {
        let transition = StateTransition::new(Idle, QrCheck, Instant::now());
        let serialized = serde_json::to_string(&transition).unwrap();

        assert!(serialized.contains("\"idle\""));
        assert!(serialized.contains("\"qr_check\""));

        let deserialized: StateTransition = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized.from, Idle);
        assert_eq!(deserialized.to, QrCheck);
    }
}
