//! Common types for kiosk peripherals.

use chrono::{DateTime, Utc};
use kiosk_core::DrawerState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Change notification published by the drawer sensor.
///
/// One event is published for every notify call, including redundant ones;
/// use [`is_change`](DrawerEvent::is_change) to tell them apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawerEvent {
    /// When the sensor was notified.
    pub timestamp: DateTime<Utc>,

    /// Drawer state before the notification.
    pub previous: DrawerState,

    /// Drawer state after the notification.
    pub new: DrawerState,
}

impl DrawerEvent {
    /// Returns `true` if the drawer actually changed position.
    #[inline]
    #[must_use]
    pub fn is_change(&self) -> bool {
        self.previous != self.new
    }
}

/// Handle returned by a subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) fn new(id: u64) -> Self {
        SubscriptionId(id)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}
