//! Inbound commands to the control service.
//!
//! These represent actions requested by the outside world (HTTP handlers,
//! the console, tests) and travel through the
//! [`CommandIntake`](crate::link::intake::CommandIntake) to the link worker.

use serde::{Deserialize, Serialize};

use crate::relay::RelayCommand;

/// Commands that external callers can send into the control core.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Switch a relay.
    Relay(RelayCommand),

    /// Replace the auto-watering humidity threshold.
    SetHumidityThreshold(f32),
}

impl From<RelayCommand> for Command {
    fn from(cmd: RelayCommand) -> Self {
        Self::Relay(cmd)
    }
}
