//! Station entry kiosk emulator.
//!
//! This crate contains the kiosk controller and everything it schedules:
//!
//! - [`StateMachine`]: the state, its transition table and history
//! - [`CountdownTimer`] and [`Scheduler`]: countdowns and one-shot delays,
//!   polled against an injected clock
//! - [`DoorController`]: the gate and its auto-close
//! - [`MaintenanceCoordinator`]: cash drawer maintenance and its journal
//! - [`Kiosk`]: the controller tying them together
//! - [`KioskRuntime`]: a tokio task driving a kiosk from commands and timers
//! - [`VirtualDisplay`]: an in-memory screen for the emulator and the CLI

pub mod controller;
pub mod countdown;
pub mod display;
pub mod door;
pub mod maintenance;
pub mod runtime;
pub mod scheduler;
pub mod state_machine;

pub use controller::{Kiosk, KioskBuilder, KioskSnapshot, TransitionPayload};
pub use countdown::{CountdownEvent, CountdownTimer};
pub use display::{Alignment, VirtualDisplay, VirtualDisplayBuilder, align_text, truncate_text};
pub use door::DoorController;
pub use maintenance::{JournalEntry, MaintenanceCoordinator, MaintenanceEvent, MaintenanceOperation};
pub use runtime::{KioskCommand, KioskHandle, KioskRuntime, RuntimeError, TokioClock};
pub use scheduler::{Scheduler, TimerHandle};
pub use state_machine::{KioskState, StateMachine, StateMachineBuilder, StateTransition};
