//! Relay state and relay commands.
//!
//! The board carries two relays, light and pump. The link worker owns the
//! only mutable [`RelayState`]; everything else submits a [`RelayCommand`]
//! and reads copies.
//!
//! ## Wire encoding
//!
//! One ASCII byte per relay, in fixed order:
//!
//! ```text
//! ┌────────────┬────────────┐
//! │ light      │ pump       │
//! │ '0' | '1'  │ '0' | '1'  │
//! └────────────┴────────────┘
//! ```

use serde::{Deserialize, Serialize};

/// Number of relays on the board (and bytes per state write).
pub const RELAY_COUNT: usize = 2;

const ON: u8 = b'1';
const OFF: u8 = b'0';

/// Commanded state of every relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RelayState {
    pub light: bool,
    pub pump: bool,
}

/// A request to change one relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelayCommand {
    SetLight(bool),
    SetPump(bool),
}

impl RelayState {
    pub const ALL_OFF: Self = Self {
        light: false,
        pump: false,
    };

    pub fn new(light: bool, pump: bool) -> Self {
        Self { light, pump }
    }

    /// Return the state with `cmd` applied. Pure; re-applying the same
    /// command yields the same state.
    #[must_use]
    pub fn apply(self, cmd: RelayCommand) -> Self {
        match cmd {
            RelayCommand::SetLight(on) => Self { light: on, ..self },
            RelayCommand::SetPump(on) => Self { pump: on, ..self },
        }
    }

    /// Encode for the device, `[light, pump]`.
    pub fn encode(&self) -> [u8; RELAY_COUNT] {
        [flag(self.light), flag(self.pump)]
    }
}

fn flag(on: bool) -> u8 {
    if on { ON } else { OFF }
}

impl core::fmt::Display for RelayState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "light={} pump={}",
            if self.light { "on" } else { "off" },
            if self.pump { "on" } else { "off" },
        )
    }
}
