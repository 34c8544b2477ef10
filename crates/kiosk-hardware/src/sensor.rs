//! Cash drawer sensor.
//!
//! The sensor is told about the drawer position by whoever observes it (a
//! maintenance panel button, a reed switch driver) and republishes every
//! notification to its subscribers. State changes are idempotent: notifying
//! "open" twice leaves the sensor open and the second event reports
//! `previous == new`.
//!
//! # Examples
//!
//! ```
//! use kiosk_hardware::DrawerSensor;
//! use std::sync::mpsc;
//!
//! let mut sensor = DrawerSensor::new();
//! let (tx, rx) = mpsc::channel();
//! sensor.subscribe(move |event| {
//!     let _ = tx.send(event.clone());
//! });
//!
//! sensor.notify_opened();
//! sensor.notify_opened();
//!
//! let events: Vec<_> = rx.try_iter().collect();
//! assert_eq!(events.len(), 2);
//! assert!(events[0].is_change());
//! assert!(!events[1].is_change());
//! ```

use crate::types::{DrawerEvent, SubscriptionId};
use chrono::Utc;
use kiosk_core::DrawerState;
use std::fmt;
use tracing::{debug, info};

type Subscriber = Box<dyn FnMut(&DrawerEvent) + Send>;

/// Idempotent open/closed sensor with change notification.
pub struct DrawerSensor {
    state: DrawerState,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_id: u64,
}

impl DrawerSensor {
    /// Create a sensor reporting a closed drawer.
    pub fn new() -> Self {
        Self {
            state: DrawerState::Closed,
            subscribers: Vec::new(),
            next_id: 0,
        }
    }

    /// Current drawer position.
    #[must_use]
    pub fn state(&self) -> DrawerState {
        self.state
    }

    /// Returns `true` if the drawer is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }

    /// Register a callback invoked on every notification.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&DrawerEvent) + Send + 'static,
    {
        let id = SubscriptionId::new(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        debug!(subscription = %id, "Drawer sensor subscriber added");
        id
    }

    /// Remove a subscriber.
    ///
    /// # Returns
    ///
    /// Returns `true` if the subscription existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    /// Number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Report that the drawer is open.
    pub fn notify_opened(&mut self) -> DrawerEvent {
        self.notify(DrawerState::Open)
    }

    /// Report that the drawer is closed.
    pub fn notify_closed(&mut self) -> DrawerEvent {
        self.notify(DrawerState::Closed)
    }

    fn notify(&mut self, new: DrawerState) -> DrawerEvent {
        let event = DrawerEvent {
            timestamp: Utc::now(),
            previous: self.state,
            new,
        };
        self.state = new;

        if event.is_change() {
            info!(previous = %event.previous, new = %event.new, "Cash drawer state changed");
        } else {
            debug!(state = %new, "Cash drawer already in requested state");
        }

        for (_, subscriber) in &mut self.subscribers {
            subscriber(&event);
        }
        event
    }
}

impl Default for DrawerSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DrawerSensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawerSensor")
            .field("state", &self.state)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
