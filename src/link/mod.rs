//! Device link subsystem.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                        Link Stack                          │
//! │                                                            │
//! │  ┌───────────┐   ┌───────────┐   ┌──────────────────────┐  │
//! │  │ Transport │──▶│ Framing   │──▶│ Worker (cycle loop)  │  │
//! │  │ (trait)   │   │ (extract) │   │  → ControlService    │  │
//! │  └───────────┘   └───────────┘   └──────────────────────┘  │
//! │       ▲                               ▲          │         │
//! │       │ relay state          Intake ──┘          ▼         │
//! │       └──────────────────────────────────── Broadcaster    │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod channels;
pub mod intake;
pub mod transport;
pub mod worker;

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::broadcast::Broadcaster;
use crate::config::ControllerConfig;
use crate::error::Result;
use crate::safety::ThreadTimer;
use crate::status::StatusHandle;

use intake::CommandIntake;
use transport::Transport;
use worker::LinkWorker;

/// Handles to a running controller.
pub struct Controller {
    pub intake: CommandIntake,
    pub status: StatusHandle,
    pub broadcaster: Arc<Broadcaster>,
    pub worker: JoinHandle<Result<()>>,
}

/// Wire a link worker with thread-backed countdowns and a broadcaster,
/// and start it on its own thread.
pub fn spawn<T>(config: &ControllerConfig, transport: T) -> std::io::Result<Controller>
where
    T: Transport + Send + 'static,
{
    let intake = CommandIntake::new();
    let status = StatusHandle::new();
    let broadcaster = Arc::new(Broadcaster::new());
    let signals = channels::timer_signal_channel();
    let timer = ThreadTimer::new(Arc::clone(&signals), config.timer_tick());

    let worker = LinkWorker::new(
        config,
        transport,
        timer,
        Arc::clone(&broadcaster),
        intake.clone(),
        signals,
        status.clone(),
    );
    let worker = thread::Builder::new()
        .name("link-worker".into())
        .spawn(move || worker.run())?;

    Ok(Controller {
        intake,
        status,
        broadcaster,
        worker,
    })
}
