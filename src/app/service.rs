//! Control service — the hexagonal core.
//!
//! [`ControlService`] owns the relay state, the pump safety timer, the
//! auto-water policy and the humidity window. It exposes a hardware-agnostic
//! API; the countdown workers and the subscribers are reached through port
//! traits injected at call sites, so the whole service runs under test
//! with mock adapters.
//!
//! ```text
//!   Command ──▶ ┌──────────────────────────┐ ──▶ EventSink
//! TimerSignal ─▶│      ControlService      │
//!  SensorFrame ▶│ Relays · Safety · Policy │ ──▶ TimerPort
//!               └──────────────────────────┘
//! ```
//!
//! Invariant: the pump relay is on exactly while a watering session runs.

use std::time::Instant;

use log::{debug, info, warn};

use crate::config::ControllerConfig;
use crate::control::{AutoWaterPolicy, HumidityWindow};
use crate::framing::SensorFrame;
use crate::relay::{RelayCommand, RelayState};
use crate::safety::{PumpSafetyTimer, SessionId, TimerSignal, WateringCause, WateringEnd};
use crate::status::{SessionStatus, StatusSnapshot};

use super::commands::Command;
use super::events::BroadcastMessage;
use super::ports::{EventSink, TimerPort};

// ───────────────────────────────────────────────────────────────
// ControlService
// ───────────────────────────────────────────────────────────────

/// The control service orchestrates all relay and watering logic.
pub struct ControlService {
    relays: RelayState,
    timer: PumpSafetyTimer,
    policy: AutoWaterPolicy,
    window: HumidityWindow,
    frames: u64,
    malformed_frames: u64,
}

impl ControlService {
    /// Construct the service from configuration.
    ///
    /// Relays start off; call [`start`](Self::start) to apply the
    /// configured initial state.
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            relays: RelayState::ALL_OFF,
            timer: PumpSafetyTimer::new(config.pump_runtime_limit()),
            policy: AutoWaterPolicy::new(config.humidity_threshold),
            window: HumidityWindow::new(),
            frames: 0,
            malformed_frames: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Apply the initial relay state. A pump configured on at startup
    /// opens a session like any other activation.
    pub fn start(
        &mut self,
        initial: RelayState,
        now: Instant,
        timer: &mut impl TimerPort,
        sink: &mut impl EventSink,
    ) {
        self.relays = RelayState {
            light: initial.light,
            pump: false,
        };
        if initial.pump {
            self.pump_on(WateringCause::Startup, now, timer, sink);
        }
        sink.emit(&BroadcastMessage::Relays(self.relays));
        info!("control service started, {}", self.relays);
    }

    /// Close any running session and turn every relay off. Used when the
    /// link goes down.
    pub fn shutdown(&mut self, timer: &mut impl TimerPort, sink: &mut impl EventSink) {
        if let Some(session) = self.timer.cancel(timer) {
            sink.emit(&BroadcastMessage::WateringEnded {
                session,
                reason: WateringEnd::LinkDown,
            });
        }
        if self.relays != RelayState::ALL_OFF {
            self.relays = RelayState::ALL_OFF;
            sink.emit(&BroadcastMessage::Relays(self.relays));
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command.
    pub fn handle_command(
        &mut self,
        cmd: Command,
        now: Instant,
        timer: &mut impl TimerPort,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            Command::Relay(RelayCommand::SetLight(on)) => {
                self.set_relays(self.relays.apply(RelayCommand::SetLight(on)), sink);
            }
            Command::Relay(RelayCommand::SetPump(true)) => {
                if self.pump_on(WateringCause::Manual, now, timer, sink) {
                    sink.emit(&BroadcastMessage::Relays(self.relays));
                }
            }
            Command::Relay(RelayCommand::SetPump(false)) => {
                if let Some(session) = self.timer.cancel(timer) {
                    sink.emit(&BroadcastMessage::WateringEnded {
                        session,
                        reason: WateringEnd::Cancelled,
                    });
                }
                self.set_relays(self.relays.apply(RelayCommand::SetPump(false)), sink);
            }
            Command::SetHumidityThreshold(threshold) => {
                if self.policy.set_threshold(threshold) {
                    info!("humidity threshold set to {}", threshold);
                    sink.emit(&BroadcastMessage::ThresholdChanged { threshold });
                }
            }
        }
    }

    // ── Timer handling ────────────────────────────────────────

    /// Apply a countdown signal. Returns `true` when it forced the pump off.
    pub fn on_timer_signal(&mut self, signal: TimerSignal, sink: &mut impl EventSink) -> bool {
        match self.timer.on_signal(signal) {
            Some(session) => {
                self.force_pump_off(session, sink);
                true
            }
            None => false,
        }
    }

    /// Expire the running session if its deadline passed without a signal.
    /// Returns `true` when it forced the pump off.
    pub fn check_deadline(
        &mut self,
        now: Instant,
        timer: &mut impl TimerPort,
        sink: &mut impl EventSink,
    ) -> bool {
        match self.timer.check_deadline(now, timer) {
            Some(session) => {
                self.force_pump_off(session, sink);
                true
            }
            None => false,
        }
    }

    // ── Frame handling ────────────────────────────────────────

    /// Handle a completed frame: decode, broadcast, evaluate auto-watering.
    /// Frames without a valid humidity value are discarded.
    pub fn on_frame(
        &mut self,
        frame: SensorFrame,
        now: Instant,
        timer: &mut impl TimerPort,
        sink: &mut impl EventSink,
    ) {
        let Some(humidity) = frame.humidity() else {
            self.malformed_frames += 1;
            debug!("malformed frame discarded: {:?}", frame.as_str());
            return;
        };
        self.frames += 1;
        self.window.push(humidity);
        sink.emit(&BroadcastMessage::Reading { frame, humidity });

        if let Some(RelayCommand::SetPump(true)) =
            self.policy.evaluate(humidity, self.timer.is_running())
        {
            info!(
                "humidity {} above threshold {}, watering",
                humidity,
                self.policy.threshold()
            );
            if self.pump_on(WateringCause::Auto, now, timer, sink) {
                sink.emit(&BroadcastMessage::Relays(self.relays));
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current relay state (a copy).
    pub fn relays(&self) -> RelayState {
        self.relays
    }

    pub fn is_watering(&self) -> bool {
        self.timer.is_running()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.timer.session().map(|s| s.id)
    }

    pub fn humidity_threshold(&self) -> f32 {
        self.policy.threshold()
    }

    /// Build a status snapshot.
    pub fn snapshot(&self, now: Instant, cycles: u64) -> StatusSnapshot {
        StatusSnapshot {
            relays: self.relays,
            watering: self.timer.session().map(|s| SessionStatus {
                id: s.id,
                cause: s.cause,
                remaining: self.timer.remaining(now).unwrap_or_default(),
            }),
            humidity_threshold: self.policy.threshold(),
            last_humidity: self.window.latest(),
            average_humidity: self.window.average(),
            frames: self.frames,
            malformed_frames: self.malformed_frames,
            cycles,
            link_up: true,
        }
    }

    // ── Internal ──────────────────────────────────────────────

    /// Start a session if idle and turn the pump on. Returns `true` if a
    /// session was opened.
    fn pump_on(
        &mut self,
        cause: WateringCause,
        now: Instant,
        timer: &mut impl TimerPort,
        sink: &mut impl EventSink,
    ) -> bool {
        let Some(session) = self.timer.start(cause, now, timer) else {
            return false;
        };
        self.relays = self.relays.apply(RelayCommand::SetPump(true));
        sink.emit(&BroadcastMessage::WateringStarted { session, cause });
        true
    }

    fn force_pump_off(&mut self, session: SessionId, sink: &mut impl EventSink) {
        if !self.relays.pump {
            warn!("session {} expired with pump already off", session);
        }
        sink.emit(&BroadcastMessage::WateringEnded {
            session,
            reason: WateringEnd::Expired,
        });
        self.set_relays(self.relays.apply(RelayCommand::SetPump(false)), sink);
    }

    fn set_relays(&mut self, next: RelayState, sink: &mut impl EventSink) {
        if next != self.relays {
            self.relays = next;
            sink.emit(&BroadcastMessage::Relays(next));
        }
    }
}
