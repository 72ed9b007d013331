//! Port traits — the boundary between control logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlService (domain)
//! ```
//!
//! The [`ControlService`](super::service::ControlService) consumes these via
//! generics, so the domain core never spawns threads or touches subscribers
//! directly. The device side has its own port,
//! [`Transport`](crate::link::transport::Transport).

use core::time::Duration;

use crate::safety::SessionId;

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → subscribers / logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits [`BroadcastMessage`](super::events::BroadcastMessage)s
/// through this port.
///
/// Implementations must not block: the link worker calls `emit` between a
/// device read and the next write.
pub trait EventSink {
    fn emit(&mut self, msg: &super::events::BroadcastMessage);
}

// ───────────────────────────────────────────────────────────────
// Timer port (driven adapter: domain → countdown workers)
// ───────────────────────────────────────────────────────────────

/// Starts and cancels watering countdowns.
///
/// A started countdown reports back through
/// [`TimerSignal`](crate::safety::TimerSignal)s tagged with its session id.
/// Neither call may block.
pub trait TimerPort {
    /// Begin counting down `duration` for `session`.
    fn start(&mut self, session: SessionId, duration: Duration);

    /// Stop the countdown for `session`; it must not report `Expired`
    /// afterwards. Unknown sessions are ignored.
    fn cancel(&mut self, session: SessionId);
}
