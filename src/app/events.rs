//! Outbound broadcast messages.
//!
//! The [`ControlService`](super::service::ControlService) emits these
//! through the [`EventSink`](super::ports::EventSink) port. The
//! [`Broadcaster`](crate::broadcast::Broadcaster) fans them out to every
//! subscriber; what a subscriber does with them (websocket push, log line)
//! is outside the core.

use serde::Serialize;

use crate::framing::SensorFrame;
use crate::relay::RelayState;
use crate::safety::{SessionId, WateringCause, WateringEnd};

/// Messages delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BroadcastMessage {
    /// A completed, well-formed frame, verbatim, with its decoded value.
    Reading { frame: SensorFrame, humidity: f32 },

    /// The commanded relay state changed.
    Relays(RelayState),

    /// A watering session opened.
    WateringStarted {
        session: SessionId,
        cause: WateringCause,
    },

    /// A watering session closed.
    WateringEnded {
        session: SessionId,
        reason: WateringEnd,
    },

    /// The auto-watering threshold was changed at runtime.
    ThresholdChanged { threshold: f32 },
}
