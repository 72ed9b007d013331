//! Log-based broadcast subscriber.
//!
//! Implements [`EventSink`] by writing every broadcast message to the
//! logger. The binary drains a [`Subscription`](crate::broadcast::Subscription)
//! into it; a websocket adapter would implement the same trait.

use log::info;

use crate::app::events::BroadcastMessage;
use crate::app::ports::EventSink;

/// Adapter that logs every [`BroadcastMessage`].
#[derive(Debug, Default)]
pub struct LogSubscriber;

impl LogSubscriber {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogSubscriber {
    fn emit(&mut self, msg: &BroadcastMessage) {
        match msg {
            BroadcastMessage::Reading { frame, humidity } => {
                info!(
                    "READING | {} | humidity={:.2}",
                    frame.as_str().unwrap_or("<binary>"),
                    humidity
                );
            }
            BroadcastMessage::Relays(state) => {
                info!("RELAYS | {}", state);
            }
            BroadcastMessage::WateringStarted { session, cause } => {
                info!("WATER | session {} started ({:?})", session, cause);
            }
            BroadcastMessage::WateringEnded { session, reason } => {
                info!("WATER | session {} ended ({:?})", session, reason);
            }
            BroadcastMessage::ThresholdChanged { threshold } => {
                info!("CONFIG | humidity threshold={}", threshold);
            }
        }
    }
}
