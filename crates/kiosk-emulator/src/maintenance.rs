//! Cash drawer maintenance.
//!
//! A maintenance cycle starts when the drawer opens and ends when the
//! operator decides whether to zero the balance. The
//! [`MaintenanceCoordinator`] owns the authentication countdown, the
//! [`MaintenanceOperation`] being performed and an audit journal of every
//! phase.
//!
//! # Journal
//!
//! Each phase is recorded as a [`JournalEntry`] with an RFC 3339 timestamp:
//!
//! ```text
//! opened → auth_success → closed → zero_decision
//! opened → auth_fail* → timeout → out_of_service → reset
//! ```

use std::collections::VecDeque;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use kiosk_core::Cents;
use kiosk_core::constants::{
    MAINTENANCE_AUTH_TIMEOUT_SECS, MAINTENANCE_URGENT_THRESHOLD_SECS, MAX_HISTORY_SIZE,
};

use crate::countdown::{CountdownEvent, CountdownTimer};

/// One phase of a maintenance cycle, with its payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum MaintenanceEvent {
    Opened,
    AuthSuccess {
        code: String,
    },
    AuthFail {
        code: String,
    },
    Timeout,
    Closed,
    ZeroDecision {
        zeroed: bool,
        balance_before: Cents,
        balance_after: Cents,
    },
    OutOfService,
    Reset {
        code: Option<String>,
    },
}

impl MaintenanceEvent {
    /// Phase name as written in the journal.
    pub fn phase(&self) -> &'static str {
        match self {
            MaintenanceEvent::Opened => "opened",
            MaintenanceEvent::AuthSuccess { .. } => "auth_success",
            MaintenanceEvent::AuthFail { .. } => "auth_fail",
            MaintenanceEvent::Timeout => "timeout",
            MaintenanceEvent::Closed => "closed",
            MaintenanceEvent::ZeroDecision { .. } => "zero_decision",
            MaintenanceEvent::OutOfService => "out_of_service",
            MaintenanceEvent::Reset { .. } => "reset",
        }
    }
}

/// Journal line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub timestamp: DateTime<Utc>,
    pub operation_id: Option<Uuid>,
    #[serde(flatten)]
    pub event: MaintenanceEvent,
}

/// State of one maintenance cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceOperation {
    pub id: Uuid,
    pub opened_at: DateTime<Utc>,
    pub authenticated_at: Option<DateTime<Utc>>,
    pub operator_code: Option<String>,
    pub closed_at: Option<DateTime<Utc>>,
    pub balance_before: Option<Cents>,
    pub balance_after: Option<Cents>,
    pub was_zeroed: Option<bool>,
}

impl MaintenanceOperation {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            opened_at: Utc::now(),
            authenticated_at: None,
            operator_code: None,
            closed_at: None,
            balance_before: None,
            balance_after: None,
            was_zeroed: None,
        }
    }

    /// Returns `true` once an operator code has been accepted.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated_at.is_some()
    }
}

/// Owns the authentication countdown, the current operation and the journal.
#[derive(Debug)]
pub struct MaintenanceCoordinator {
    auth_timeout_secs: u32,
    countdown: CountdownTimer,
    operation: Option<MaintenanceOperation>,
    journal: VecDeque<JournalEntry>,
}

impl MaintenanceCoordinator {
    /// Create a coordinator with the default 10 second window.
    pub fn new() -> Self {
        Self::with_auth_timeout(MAINTENANCE_AUTH_TIMEOUT_SECS)
    }

    /// Create a coordinator with a custom authentication window.
    pub fn with_auth_timeout(seconds: u32) -> Self {
        Self {
            auth_timeout_secs: seconds,
            countdown: CountdownTimer::new(),
            operation: None,
            journal: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    /// Start a new maintenance cycle and record `opened`.
    ///
    /// An unfinished previous cycle is abandoned.
    pub fn begin_operation(&mut self) -> &MaintenanceOperation {
        if let Some(previous) = self.operation.take() {
            warn!(operation = %previous.id, "Abandoning unfinished maintenance operation");
        }
        let operation = MaintenanceOperation::new();
        info!(operation = %operation.id, "Maintenance operation started");
        self.push(Some(operation.id), MaintenanceEvent::Opened);
        self.operation.insert(operation)
    }

    /// The cycle in progress, if any.
    pub fn current_operation(&self) -> Option<&MaintenanceOperation> {
        self.operation.as_ref()
    }

    /// Close the cycle in progress and hand it back.
    pub fn finish_operation(&mut self) -> Option<MaintenanceOperation> {
        let operation = self.operation.take()?;
        debug!(operation = %operation.id, "Maintenance operation finished");
        Some(operation)
    }

    /// Start the authentication countdown.
    ///
    /// # Returns
    ///
    /// Returns the initial tick with the full window.
    pub fn arm_auth_timeout(&mut self, now: Instant) -> CountdownEvent {
        debug!(seconds = self.auth_timeout_secs, "Maintenance auth countdown armed");
        self.countdown.start(self.auth_timeout_secs, now)
    }

    /// Stop the authentication countdown. Idempotent.
    pub fn stop_auth_timeout(&mut self) -> bool {
        let stopped = self.countdown.cancel();
        if stopped {
            debug!(
                remaining = self.countdown.remaining_secs(),
                "Maintenance auth countdown stopped"
            );
        }
        stopped
    }

    /// Returns `true` while the authentication countdown runs.
    pub fn is_auth_timeout_armed(&self) -> bool {
        self.countdown.is_running()
    }

    /// When the countdown next needs attention.
    pub fn next_wake(&self) -> Option<Instant> {
        self.countdown.next_wake()
    }

    /// Advance the countdown one step if due.
    ///
    /// Ticks at or below the urgent threshold are logged as warnings.
    pub fn fire_due(&mut self, now: Instant) -> Option<CountdownEvent> {
        let event = self.countdown.fire_due(now)?;
        match event {
            CountdownEvent::Tick(remaining) if remaining <= MAINTENANCE_URGENT_THRESHOLD_SECS => {
                warn!(remaining, "Maintenance authentication about to expire");
            }
            CountdownEvent::Tick(remaining) => debug!(remaining, "Maintenance countdown"),
            CountdownEvent::Expired => warn!("Maintenance authentication window expired"),
        }
        Some(event)
    }

    /// Record a phase for the cycle in progress and update the operation.
    pub fn record(&mut self, event: MaintenanceEvent) {
        let now = Utc::now();
        if let Some(operation) = self.operation.as_mut() {
            match &event {
                MaintenanceEvent::AuthSuccess { code } => {
                    operation.authenticated_at = Some(now);
                    operation.operator_code = Some(code.clone());
                }
                MaintenanceEvent::Closed => operation.closed_at = Some(now),
                MaintenanceEvent::ZeroDecision {
                    zeroed,
                    balance_before,
                    balance_after,
                } => {
                    operation.was_zeroed = Some(*zeroed);
                    operation.balance_before = Some(*balance_before);
                    operation.balance_after = Some(*balance_after);
                }
                _ => {}
            }
        }

        let operation_id = self.operation.as_ref().map(|op| op.id);
        match &event {
            MaintenanceEvent::AuthFail { code } => {
                warn!(operation = ?operation_id, code = %code, "Maintenance: auth_fail");
            }
            MaintenanceEvent::Timeout | MaintenanceEvent::OutOfService => {
                warn!(operation = ?operation_id, phase = event.phase(), "Maintenance phase");
            }
            MaintenanceEvent::ZeroDecision {
                zeroed,
                balance_before,
                balance_after,
            } => info!(
                operation = ?operation_id,
                zeroed,
                balance_before = balance_before.as_u32(),
                balance_after = balance_after.as_u32(),
                "Maintenance: zero_decision"
            ),
            _ => info!(operation = ?operation_id, phase = event.phase(), "Maintenance phase"),
        }

        self.push_at(now, operation_id, event);
    }

    /// Audit journal, oldest first. Bounded to the most recent entries.
    pub fn journal(&self) -> &VecDeque<JournalEntry> {
        &self.journal
    }

    /// Serialize the journal as a JSON array.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn journal_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.journal)
    }

    fn push(&mut self, operation_id: Option<Uuid>, event: MaintenanceEvent) {
        self.push_at(Utc::now(), operation_id, event);
    }

    fn push_at(&mut self, timestamp: DateTime<Utc>, operation_id: Option<Uuid>, event: MaintenanceEvent) {
        self.journal.push_back(JournalEntry {
            timestamp,
            operation_id,
            event,
        });
        if self.journal.len() > MAX_HISTORY_SIZE {
            self.journal.pop_front();
        }
    }
}

impl Default for MaintenanceCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
