//! Inter-worker channels.
//!
//! Bounded `embassy-sync` MPMC channels bridge the external command
//! sources and the countdown workers with the link worker. Producers never
//! block: when a channel is full the oldest pending message is discarded so
//! the newest one always gets in.
//!
//! ```text
//! ┌──────────────┐  Command      ┌──────────────┐
//! │ Console      │──────────────▶│              │
//! └──────────────┘               │ Link Worker  │
//! ┌──────────────┐  TimerSignal  │ (try_receive)│
//! │ Countdown    │──────────────▶│              │
//! └──────────────┘               └──────────────┘
//! ```

use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};

use crate::app::commands::Command;
use crate::safety::TimerSignal;

/// Channel depth for pending commands.
pub const COMMAND_DEPTH: usize = 8;

/// Channel depth for countdown signals.
pub const TIMER_SIGNAL_DEPTH: usize = 8;

pub type CommandChannel = Channel<CriticalSectionRawMutex, Command, COMMAND_DEPTH>;

pub type TimerSignalChannel = Channel<CriticalSectionRawMutex, TimerSignal, TIMER_SIGNAL_DEPTH>;

/// Push `msg`, evicting the oldest queued messages until it fits.
/// Returns the number of messages evicted.
pub fn push_drop_oldest<T, const N: usize>(
    channel: &Channel<CriticalSectionRawMutex, T, N>,
    mut msg: T,
) -> usize {
    let mut evicted = 0;
    loop {
        match channel.try_send(msg) {
            Ok(()) => return evicted,
            Err(TrySendError::Full(back)) => {
                msg = back;
                if channel.try_receive().is_ok() {
                    evicted += 1;
                }
            }
        }
    }
}

/// Fresh shared timer-signal channel.
pub fn timer_signal_channel() -> Arc<TimerSignalChannel> {
    Arc::new(Channel::new())
}
