//! Controller configuration parameters.
//!
//! All tunables for the control core. The core takes these as plain values;
//! only the binary consults the environment, through [`ControllerConfig::from_env`].

use core::str::FromStr;
use core::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::framing::FramingMode;
use crate::relay::RelayState;

/// Pump runtime limit used when none (or zero) is configured.
pub const DEFAULT_PUMP_RUNTIME_LIMIT_SECS: u32 = 5;

/// Upper bound accepted for the pump runtime limit.
pub const MAX_PUMP_RUNTIME_LIMIT_SECS: u32 = 3600;

/// Largest accepted device read chunk.
pub const MAX_READ_CHUNK: usize = 1024;

pub const ENV_HUMIDITY_SENSOR_MIN: &str = "APP_HUMIDITY_SENSOR_MIN";
pub const ENV_PUMP_RUNTIME_LIMIT_SECONDS: &str = "APP_PUMP_RUNTIME_LIMIT_SECONDS";
pub const ENV_LIGHT_STATUS: &str = "APP_LIGHT_STATUS";
pub const ENV_PUMP_STATUS: &str = "APP_PUMP_STATUS";
pub const ENV_SERIAL_DEVICE: &str = "APP_SERIAL_DEVICE";
pub const ENV_SERIAL_BAUD: &str = "APP_SERIAL_BAUD";
pub const ENV_FRAMING: &str = "APP_FRAMING";

/// Core controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    // --- Device link ---
    /// Serial device path
    pub device_path: String,
    /// Serial baud rate (must match the board firmware)
    pub baud_rate: u32,
    /// Telemetry dialect spoken by the board
    pub framing: FramingMode,
    /// Bytes requested per device read
    pub read_chunk_size: usize,

    // --- Watering ---
    /// Readings above this value start an automatic watering session
    pub humidity_threshold: f32,
    /// Maximum continuous pump-on time (seconds, 0 = default)
    pub pump_runtime_limit_secs: u32,
    /// Interval between "still running" timer signals (milliseconds)
    pub timer_tick_ms: u32,

    // --- Initial relay state ---
    pub initial_light: bool,
    pub initial_pump: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            device_path: "/dev/ttyACM0".to_owned(),
            baud_rate: 9600,
            framing: FramingMode::Marker,
            read_chunk_size: 4,

            humidity_threshold: 300.0,
            pump_runtime_limit_secs: DEFAULT_PUMP_RUNTIME_LIMIT_SECS,
            timer_tick_ms: 1000,

            initial_light: false,
            initial_pump: false,
        }
    }
}

impl ControllerConfig {
    /// Overlay the process environment onto the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Overlay values from `lookup` onto the defaults.
    ///
    /// Values that fail to parse are logged and the default is kept.
    /// Relay status variables are on only for the exact value `on`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        overlay(&lookup, ENV_HUMIDITY_SENSOR_MIN, &mut cfg.humidity_threshold);
        overlay(&lookup, ENV_PUMP_RUNTIME_LIMIT_SECONDS, &mut cfg.pump_runtime_limit_secs);
        overlay(&lookup, ENV_SERIAL_BAUD, &mut cfg.baud_rate);
        if let Some(path) = lookup(ENV_SERIAL_DEVICE).filter(|p| !p.is_empty()) {
            cfg.device_path = path;
        }
        if let Some(raw) = lookup(ENV_FRAMING) {
            match raw.parse() {
                Ok(mode) => cfg.framing = mode,
                Err(()) => warn!("{}={:?} not recognised, keeping {:?}", ENV_FRAMING, raw, cfg.framing),
            }
        }
        cfg.initial_light = lookup(ENV_LIGHT_STATUS).as_deref() == Some("on");
        cfg.initial_pump = lookup(ENV_PUMP_STATUS).as_deref() == Some("on");
        cfg
    }

    /// Reject values that would make the controller unsafe or unusable.
    pub fn validate(&self) -> Result<()> {
        if !self.humidity_threshold.is_finite() {
            return Err(Error::Config("humidity threshold must be finite"));
        }
        if self.pump_runtime_limit_secs > MAX_PUMP_RUNTIME_LIMIT_SECS {
            return Err(Error::Config("pump runtime limit above one hour"));
        }
        if self.timer_tick_ms == 0 {
            return Err(Error::Config("timer tick must be non-zero"));
        }
        if self.read_chunk_size == 0 || self.read_chunk_size > MAX_READ_CHUNK {
            return Err(Error::Config("read chunk size out of range"));
        }
        if self.baud_rate == 0 {
            return Err(Error::Config("baud rate must be non-zero"));
        }
        Ok(())
    }

    /// Effective pump runtime limit; zero falls back to the default.
    pub fn pump_runtime_limit(&self) -> Duration {
        let secs = match self.pump_runtime_limit_secs {
            0 => DEFAULT_PUMP_RUNTIME_LIMIT_SECS,
            n => n,
        };
        Duration::from_secs(u64::from(secs))
    }

    pub fn timer_tick(&self) -> Duration {
        Duration::from_millis(u64::from(self.timer_tick_ms.max(1)))
    }

    pub fn initial_relays(&self) -> RelayState {
        RelayState::new(self.initial_light, self.initial_pump)
    }
}

fn overlay<T: FromStr + core::fmt::Debug>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    slot: &mut T,
) {
    let Some(raw) = lookup(key) else { return };
    if raw.is_empty() {
        return;
    }
    match raw.trim().parse() {
        Ok(v) => *slot = v,
        Err(_) => warn!("{}={:?} is not valid, keeping {:?}", key, raw, slot),
    }
}
