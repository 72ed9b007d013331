//! Auto-water policy
//!
//! Readings are raw soil-sensor values: higher means drier. When a reading
//! exceeds the threshold and no watering session is running, the policy
//! asks for the pump. The session it starts is bounded by the pump safety
//! timer like any manual one.

use log::warn;

use crate::relay::RelayCommand;

/// Threshold-based auto-water policy
#[derive(Debug, Clone)]
pub struct AutoWaterPolicy {
    threshold: f32,
}

impl AutoWaterPolicy {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Replace the threshold. Non-finite values are rejected.
    pub fn set_threshold(&mut self, threshold: f32) -> bool {
        if !threshold.is_finite() {
            warn!("humidity threshold {} rejected", threshold);
            return false;
        }
        self.threshold = threshold;
        true
    }

    /// Decide whether `reading` should start watering.
    pub fn evaluate(&self, reading: f32, session_running: bool) -> Option<RelayCommand> {
        (!session_running && reading > self.threshold).then_some(RelayCommand::SetPump(true))
    }
}
