//! Command intake — the non-blocking entry point for external callers.
//!
//! Callers hold a cloned [`CommandIntake`] and `submit` from any thread.
//! The link worker takes at most one command per cycle with a
//! non-blocking poll. When commands arrive faster than cycles run, the
//! queue evicts the oldest pending ones: only the most recently submitted
//! command is guaranteed to be observed (last-write-wins). A superseded
//! command is expected behaviour, not a delivery failure.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use embassy_sync::channel::Channel;
use log::debug;

use super::channels::{CommandChannel, push_drop_oldest};
use crate::app::commands::Command;

#[derive(Clone)]
pub struct CommandIntake {
    channel: Arc<CommandChannel>,
    superseded: Arc<AtomicU64>,
}

impl Default for CommandIntake {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandIntake {
    pub fn new() -> Self {
        Self {
            channel: Arc::new(Channel::new()),
            superseded: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Queue a command. Never blocks.
    pub fn submit(&self, cmd: impl Into<Command>) {
        let cmd = cmd.into();
        let evicted = push_drop_oldest(&self.channel, cmd);
        if evicted > 0 {
            self.superseded.fetch_add(evicted as u64, Ordering::Relaxed);
            debug!("intake full, {} older command(s) superseded by {:?}", evicted, cmd);
        }
    }

    /// Take the next pending command, if any.
    pub fn try_take(&self) -> Option<Command> {
        self.channel.try_receive().ok()
    }

    /// Commands waiting for the link worker.
    pub fn pending(&self) -> usize {
        self.channel.len()
    }

    /// Commands evicted before the worker saw them.
    pub fn superseded(&self) -> u64 {
        self.superseded.load(Ordering::Relaxed)
    }
}
