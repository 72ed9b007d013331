//! Read-only status view for external callers.
//!
//! The link worker publishes a [`StatusSnapshot`] after every cycle into a
//! shared cell; readers copy it out. No reader ever holds a reference into
//! the live relay state.

use core::cell::Cell;
use core::time::Duration;
use std::sync::Arc;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use serde::Serialize;

use crate::relay::RelayState;
use crate::safety::{SessionId, WateringCause};

/// The running watering session as seen from outside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SessionStatus {
    pub id: SessionId,
    pub cause: WateringCause,
    pub remaining: Duration,
}

/// Point-in-time controller state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub relays: RelayState,
    pub watering: Option<SessionStatus>,
    pub humidity_threshold: f32,
    pub last_humidity: Option<f32>,
    pub average_humidity: Option<f32>,
    pub frames: u64,
    pub malformed_frames: u64,
    pub cycles: u64,
    /// False once the link worker has stopped.
    pub link_up: bool,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self {
            relays: RelayState::ALL_OFF,
            watering: None,
            humidity_threshold: 0.0,
            last_humidity: None,
            average_humidity: None,
            frames: 0,
            malformed_frames: 0,
            cycles: 0,
            link_up: false,
        }
    }
}

/// Shared handle to the latest snapshot. Cheap to clone.
#[derive(Clone)]
pub struct StatusHandle {
    cell: Arc<Mutex<CriticalSectionRawMutex, Cell<StatusSnapshot>>>,
}

impl Default for StatusHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusHandle {
    pub fn new() -> Self {
        Self {
            cell: Arc::new(Mutex::new(Cell::new(StatusSnapshot::default()))),
        }
    }

    /// Copy of the latest snapshot.
    pub fn snapshot(&self) -> StatusSnapshot {
        self.cell.lock(Cell::get)
    }

    pub(crate) fn store(&self, snapshot: StatusSnapshot) {
        self.cell.lock(|c| c.set(snapshot));
    }

    pub(crate) fn mark_link_down(&self) {
        self.cell.lock(|c| {
            let mut s = c.get();
            s.link_up = false;
            c.set(s);
        });
    }
}
