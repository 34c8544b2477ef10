//! Peripheral layer for the station entry kiosk.
//!
//! This crate provides the collaborators the kiosk controller drives and the
//! sensors that feed it:
//!
//! - [`KioskDisplay`], [`DoorPanel`] and [`Sounder`]: outbound traits the
//!   controller calls fire-and-forget
//! - [`DrawerSensor`]: idempotent cash drawer sensor with subscribers
//! - [`AlarmController`]: idempotent on/off alarm over a [`Sounder`]
//!
//! # Mock Implementations
//!
//! The [`mock`] module provides recording implementations of every trait,
//! each paired with a cloneable handle for assertions:
//!
//! ```
//! use kiosk_hardware::AlarmController;
//! use kiosk_hardware::mock::MockSounder;
//!
//! let (sounder, handle) = MockSounder::new();
//! let mut alarm = AlarmController::new(Box::new(sounder));
//!
//! alarm.activate();
//! assert!(handle.is_sounding());
//! ```
//!
//! # Error Handling
//!
//! Trait methods that reach a device return [`Result<T>`][error::Result]
//! with a [`HardwareError`]. Callers log these failures; they never change
//! the kiosk state.

pub mod alarm;
pub mod error;
pub mod mock;
pub mod sensor;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use alarm::AlarmController;
pub use error::{HardwareError, Result};
pub use sensor::DrawerSensor;
pub use traits::{DoorPanel, KioskDisplay, NoopDoorPanel, SilentSounder, Sounder};
pub use types::{DrawerEvent, SubscriptionId};
