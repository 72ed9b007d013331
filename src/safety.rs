//! Pump safety timer.
//!
//! Bounds every watering session to the configured runtime limit. The
//! timer is an explicit state machine owned by the link worker; the actual
//! countdown runs on a separate worker behind the [`TimerPort`] and reports
//! back through [`TimerSignal`]s.
//!
//! ## Session lifecycle
//!
//! ```text
//!            start (pump on, idle)
//!   ┌──────┐ ─────────────────────▶ ┌─────────┐
//!   │ Idle │                        │ Running │──▶ Tick { remaining } …
//!   └──────┘ ◀───────────────────── └─────────┘
//!             Expired  → pump forced off
//!             cancel   → SetPump(false), no expiry
//! ```
//!
//! 1. Turning the pump on while idle opens a session with a fresh
//!    [`SessionId`] and starts a countdown.
//! 2. Start requests while running are ignored; the countdown is never
//!    extended or restarted.
//! 3. `Expired` for the running session closes it and the caller forces
//!    the pump off. This happens once per session.
//! 4. Cancellation closes the session without an expiry. Signals that
//!    arrive later for a closed session are stale and ignored.
//!
//! The state machine also keeps the session deadline. If a cycle observes
//! the deadline passed before the expiry signal arrives, it expires the
//! session itself; the late signal is then stale.

use core::time::Duration;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::TimerPort;
use crate::link::channels::{TimerSignalChannel, push_drop_oldest};

/// Identifies one watering session.
pub type SessionId = u32;

/// Message from a countdown worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerSignal {
    /// The session is still running.
    Tick { session: SessionId, remaining: Duration },
    /// The runtime limit elapsed.
    Expired { session: SessionId },
}

/// What turned the pump on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WateringCause {
    Manual,
    Auto,
    Startup,
}

/// Why a watering session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WateringEnd {
    /// Runtime limit reached; pump forced off.
    Expired,
    /// Explicit `SetPump(false)`.
    Cancelled,
    /// Link worker stopped.
    LinkDown,
}

/// The active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WateringSession {
    pub id: SessionId,
    pub cause: WateringCause,
    pub started_at: Instant,
    pub deadline: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    Idle,
    Running(WateringSession),
}

/// Idle/Running state machine for the pump runtime limit.
#[derive(Debug)]
pub struct PumpSafetyTimer {
    duration: Duration,
    state: TimerState,
    next_session: SessionId,
    /// Last remaining time reported by the countdown worker.
    remaining: Option<Duration>,
}

impl PumpSafetyTimer {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            state: TimerState::Idle,
            next_session: 1,
            remaining: None,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, TimerState::Running(_))
    }

    pub fn session(&self) -> Option<WateringSession> {
        match self.state {
            TimerState::Running(s) => Some(s),
            TimerState::Idle => None,
        }
    }

    /// Remaining time of the running session, from the latest tick if one
    /// arrived, otherwise from the deadline.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        let session = self.session()?;
        Some(
            self.remaining
                .unwrap_or_else(|| session.deadline.saturating_duration_since(now)),
        )
    }

    /// Open a session if idle. Returns the new session id, or `None` when a
    /// session is already running (it is left untouched).
    pub fn start(
        &mut self,
        cause: WateringCause,
        now: Instant,
        timer: &mut impl TimerPort,
    ) -> Option<SessionId> {
        if let TimerState::Running(s) = self.state {
            debug!("watering session {} already running, start ignored", s.id);
            return None;
        }
        let id = self.next_session;
        self.next_session = self.next_session.wrapping_add(1).max(1);
        self.state = TimerState::Running(WateringSession {
            id,
            cause,
            started_at: now,
            deadline: now + self.duration,
        });
        self.remaining = None;
        timer.start(id, self.duration);
        info!(
            "watering session {} started ({:?}), limit {:?}",
            id, cause, self.duration
        );
        Some(id)
    }

    /// Abandon the running session without an expiry.
    pub fn cancel(&mut self, timer: &mut impl TimerPort) -> Option<SessionId> {
        let TimerState::Running(s) = self.state else {
            return None;
        };
        timer.cancel(s.id);
        self.close();
        info!("watering session {} cancelled", s.id);
        Some(s.id)
    }

    /// Apply a countdown signal. Returns the session id when this signal
    /// expired the running session.
    pub fn on_signal(&mut self, signal: TimerSignal) -> Option<SessionId> {
        let TimerState::Running(s) = self.state else {
            debug!("timer signal {:?} with no running session, ignored", signal);
            return None;
        };
        match signal {
            TimerSignal::Tick { session, remaining } if session == s.id => {
                self.remaining = Some(remaining);
                None
            }
            TimerSignal::Expired { session } if session == s.id => {
                self.close();
                warn!("watering session {} reached its limit, pump forced off", s.id);
                Some(s.id)
            }
            stale => {
                debug!("stale timer signal {:?} (running {}), ignored", stale, s.id);
                None
            }
        }
    }

    /// Expire the running session if its deadline has passed.
    pub fn check_deadline(
        &mut self,
        now: Instant,
        timer: &mut impl TimerPort,
    ) -> Option<SessionId> {
        let TimerState::Running(s) = self.state else {
            return None;
        };
        if now < s.deadline {
            return None;
        }
        timer.cancel(s.id);
        self.close();
        warn!(
            "watering session {} past deadline before expiry signal, pump forced off",
            s.id
        );
        Some(s.id)
    }

    fn close(&mut self) {
        self.state = TimerState::Idle;
        self.remaining = None;
    }
}

// ---------------------------------------------------------------------------
// Countdown worker
// ---------------------------------------------------------------------------

/// [`TimerPort`] backed by one OS thread per session.
///
/// Each countdown sleeps in `tick` steps, pushing `Tick` signals, and
/// finishes with one `Expired` unless its cancel flag was raised first.
pub struct ThreadTimer {
    signals: Arc<TimerSignalChannel>,
    tick: Duration,
    active: Option<(SessionId, Arc<AtomicBool>)>,
}

impl ThreadTimer {
    pub fn new(signals: Arc<TimerSignalChannel>, tick: Duration) -> Self {
        Self {
            signals,
            tick: tick.max(Duration::from_millis(1)),
            active: None,
        }
    }
}

impl TimerPort for ThreadTimer {
    fn start(&mut self, session: SessionId, duration: Duration) {
        if let Some((old, flag)) = self.active.take() {
            debug!("countdown {} superseded by {}", old, session);
            flag.store(true, Ordering::Release);
        }
        let cancel = Arc::new(AtomicBool::new(false));
        let signals = Arc::clone(&self.signals);
        let tick = self.tick;
        let flag = Arc::clone(&cancel);
        let spawned = thread::Builder::new()
            .name(format!("pump-timer-{session}"))
            .spawn(move || countdown(session, duration, tick, &flag, &signals));
        match spawned {
            Ok(_) => self.active = Some((session, cancel)),
            // The deadline backstop in PumpSafetyTimer still bounds the session.
            Err(e) => warn!("countdown {} could not be spawned: {}", session, e),
        }
    }

    fn cancel(&mut self, session: SessionId) {
        if let Some((id, flag)) = &self.active {
            if *id == session {
                flag.store(true, Ordering::Release);
                self.active = None;
            }
        }
    }
}

impl Drop for ThreadTimer {
    fn drop(&mut self) {
        if let Some((_, flag)) = self.active.take() {
            flag.store(true, Ordering::Release);
        }
    }
}

fn countdown(
    session: SessionId,
    duration: Duration,
    tick: Duration,
    cancel: &AtomicBool,
    signals: &TimerSignalChannel,
) {
    let started = Instant::now();
    loop {
        if cancel.load(Ordering::Acquire) {
            debug!("countdown {} cancelled", session);
            return;
        }
        let elapsed = started.elapsed();
        if elapsed >= duration {
            break;
        }
        let remaining = duration - elapsed;
        if signals
            .try_send(TimerSignal::Tick { session, remaining })
            .is_err()
        {
            debug!("countdown {} tick dropped, signal channel full", session);
        }
        thread::sleep(tick.min(remaining));
    }
    if !cancel.load(Ordering::Acquire) {
        push_drop_oldest(signals, TimerSignal::Expired { session });
    }
}
