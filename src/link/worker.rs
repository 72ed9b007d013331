//! Serial link worker — the control loop.
//!
//! One worker owns the device link, the frame extractor and the
//! [`ControlService`]. Every cycle:
//!
//! ```text
//!  ┌─▶ (a) poll timer signals / one command   (non-blocking)
//!  │   (b) write relay state                  [light, pump]
//!  │   (c) read next chunk                    (blocks here, bounded)
//!  │   (d) feed bytes to the extractor
//!  │   (e) completed frames → service (broadcast + auto-water)
//!  └───────────────────────────────────────────┘
//! ```
//!
//! At most one state change is applied in step (a): an expiry from the
//! countdown worker (or the deadline backstop) takes precedence over a
//! pending command, which then waits for the next cycle.
//!
//! Any link error or a zero-byte read ends the loop. There is no reconnect;
//! the caller decides what a dead link means for the process. A read that
//! times out is not an error: the cycle ends with no bytes and the next one
//! polls again, so the pump runtime limit holds even when the board is
//! silent.

use std::sync::Arc;
use std::time::Instant;

use log::{debug, error, info};

use super::channels::TimerSignalChannel;
use super::intake::CommandIntake;
use super::transport::{Transport, write_all};
use crate::app::ports::{EventSink, TimerPort};
use crate::app::service::ControlService;
use crate::config::ControllerConfig;
use crate::error::{Error, Result};
use crate::framing::{Extractor, FrameExtractor};
use crate::relay::RelayState;
use crate::status::StatusHandle;

/// What step (a) applied in a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleAction {
    Idle,
    Expired,
    Command,
}

pub struct LinkWorker<T: Transport, P: TimerPort, S: EventSink> {
    transport: T,
    timer: P,
    sink: S,
    extractor: Extractor,
    service: ControlService,
    intake: CommandIntake,
    signals: Arc<TimerSignalChannel>,
    status: StatusHandle,
    initial: RelayState,
    read_buf: Vec<u8>,
    cycles: u64,
    started: bool,
}

impl<T: Transport, P: TimerPort, S: EventSink> LinkWorker<T, P, S> {
    pub fn new(
        config: &ControllerConfig,
        transport: T,
        timer: P,
        sink: S,
        intake: CommandIntake,
        signals: Arc<TimerSignalChannel>,
        status: StatusHandle,
    ) -> Self {
        Self {
            transport,
            timer,
            sink,
            extractor: Extractor::for_mode(config.framing),
            service: ControlService::new(config),
            intake,
            signals,
            status,
            initial: config.initial_relays(),
            read_buf: vec![0; config.read_chunk_size.max(1)],
            cycles: 0,
            started: false,
        }
    }

    /// Run cycles until the link fails. Always returns an error.
    pub fn run(mut self) -> Result<()> {
        info!("link worker running ({:?} framing)", self.extractor.mode());
        loop {
            if let Err(e) = self.cycle() {
                self.stop(&e);
                return Err(e);
            }
        }
    }

    /// Run one full cycle. A read timeout ends the cycle early without
    /// error, so expiries are still applied while the board is silent.
    pub fn cycle(&mut self) -> Result<()> {
        let now = Instant::now();
        self.ensure_started(now);
        self.poll_intake(now);
        self.status.store(self.service.snapshot(now, self.cycles));

        write_all(&mut self.transport, &self.service.relays().encode())?;

        let n = match self.transport.read(&mut self.read_buf).map_err(Into::<Error>::into) {
            Ok(0) => return Err(Error::EndOfStream),
            Ok(n) => n,
            Err(e) if !e.is_link_fatal() => {
                debug!("no bytes this cycle: {}", e);
                0
            }
            Err(e) => return Err(e),
        };
        let now = Instant::now();
        for &byte in &self.read_buf[..n] {
            if let Some(frame) = self.extractor.push(byte) {
                self.service
                    .on_frame(frame, now, &mut self.timer, &mut self.sink);
            }
        }

        self.cycles += 1;
        self.status.store(self.service.snapshot(now, self.cycles));
        Ok(())
    }

    /// Step (a): apply at most one expiry or command.
    pub fn poll_intake(&mut self, now: Instant) -> CycleAction {
        self.ensure_started(now);
        while let Ok(signal) = self.signals.try_receive() {
            if self.service.on_timer_signal(signal, &mut self.sink) {
                return CycleAction::Expired;
            }
        }
        if self
            .service
            .check_deadline(now, &mut self.timer, &mut self.sink)
        {
            return CycleAction::Expired;
        }
        match self.intake.try_take() {
            Some(cmd) => {
                debug!("applying {:?}", cmd);
                self.service
                    .handle_command(cmd, now, &mut self.timer, &mut self.sink);
                CycleAction::Command
            }
            None => CycleAction::Idle,
        }
    }

    pub fn service(&self) -> &ControlService {
        &self.service
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    fn ensure_started(&mut self, now: Instant) {
        if !self.started {
            self.started = true;
            self.service
                .start(self.initial, now, &mut self.timer, &mut self.sink);
            self.status.store(self.service.snapshot(now, self.cycles));
        }
    }

    /// Best-effort safe state after a fatal error.
    fn stop(&mut self, cause: &Error) {
        error!("link worker stopping after {} cycles: {}", self.cycles, cause);
        self.extractor.reset();
        self.service.shutdown(&mut self.timer, &mut self.sink);
        if write_all(&mut self.transport, &RelayState::ALL_OFF.encode()).is_err() {
            debug!("all-off write failed on a dead link");
        }
        self.status
            .store(self.service.snapshot(Instant::now(), self.cycles));
        self.status.mark_link_down();
    }
}
