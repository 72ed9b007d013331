//! Sensor frame extraction from the raw device byte stream.
//!
//! The board firmware has shipped two telemetry dialects over the years,
//! so extraction is a strategy behind the [`FrameExtractor`] trait:
//!
//! ```text
//!            ┌──────────────────────┐
//!  RawByte ─▶│ MarkerExtractor      │─▶ {"humidityValue":250}
//!            │ NumericExtractor     │─▶ 394.00
//!            └──────────────────────┘
//! ```
//!
//! Extractors are fed one byte at a time and return `Some(frame)` only on
//! the byte that completes a frame. Truncated or malformed input is
//! dropped by resetting internal state; a partial frame never escapes.
//! Decoding the humidity value out of a frame is a separate step
//! ([`SensorFrame::humidity`]).

pub mod marker;
pub mod numeric;

use core::str::FromStr;

use heapless::Vec;
use serde::{Deserialize, Serialize, Serializer};

pub use marker::MarkerExtractor;
pub use numeric::NumericExtractor;

/// Largest frame either dialect will assemble.
pub const MAX_FRAME_LEN: usize = 256;

/// Frame payload storage.
pub type FrameBytes = Vec<u8, MAX_FRAME_LEN>;

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// Which dialect produced a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Marker,
    Numeric,
}

/// One complete, self-delimited unit of telemetry, kept verbatim.
///
/// Serializes as `{"dialect": .., "raw": ..}` with `raw` the frame text
/// exactly as the device sent it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorFrame {
    dialect: Dialect,
    #[serde(rename = "raw", serialize_with = "serialize_verbatim")]
    bytes: FrameBytes,
}

fn serialize_verbatim<S: Serializer>(bytes: &FrameBytes, serializer: S) -> Result<S::Ok, S::Error> {
    match core::str::from_utf8(bytes) {
        Ok(text) => serializer.serialize_str(text),
        Err(_) => serializer.serialize_bytes(bytes),
    }
}

#[derive(Deserialize)]
struct MarkerTelemetry {
    #[serde(rename = "humidityValue")]
    humidity_value: f32,
}

impl SensorFrame {
    pub(crate) fn new(dialect: Dialect, bytes: FrameBytes) -> Self {
        Self { dialect, bytes }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The frame exactly as received, delimiters included for marker frames.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The frame as text, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.bytes).ok()
    }

    /// Decode the humidity reading carried by this frame.
    ///
    /// Marker frames must be a JSON object with a numeric `humidityValue`
    /// field (other fields are ignored); numeric frames must parse as a
    /// decimal number. Returns `None` for anything else.
    pub fn humidity(&self) -> Option<f32> {
        let value = match self.dialect {
            Dialect::Marker => {
                serde_json::from_slice::<MarkerTelemetry>(&self.bytes)
                    .ok()?
                    .humidity_value
            }
            Dialect::Numeric => self.as_str()?.parse::<f32>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

// ---------------------------------------------------------------------------
// Extractor capability
// ---------------------------------------------------------------------------

/// Byte-at-a-time frame assembler.
pub trait FrameExtractor {
    /// Feed one byte. Returns a frame only on the byte that completes it.
    fn push(&mut self, byte: u8) -> Option<SensorFrame>;

    /// Abandon any partial frame.
    fn reset(&mut self);
}

/// Feed a whole block and collect every completed frame in order.
pub fn extract_all(extractor: &mut impl FrameExtractor, bytes: &[u8]) -> std::vec::Vec<SensorFrame> {
    bytes.iter().filter_map(|&b| extractor.push(b)).collect()
}

// ---------------------------------------------------------------------------
// Dialect selection
// ---------------------------------------------------------------------------

/// Configured framing dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FramingMode {
    /// `{ ... }` delimited JSON objects.
    #[default]
    Marker,
    /// `:` sentinel followed by six digits or dots.
    Numeric,
}

impl FromStr for FramingMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "marker" | "json" => Ok(Self::Marker),
            "numeric" | "fixed" => Ok(Self::Numeric),
            _ => Err(()),
        }
    }
}

/// Extractor chosen at startup from [`FramingMode`].
#[derive(Debug)]
pub enum Extractor {
    Marker(MarkerExtractor),
    Numeric(NumericExtractor),
}

impl Extractor {
    pub fn for_mode(mode: FramingMode) -> Self {
        match mode {
            FramingMode::Marker => Self::Marker(MarkerExtractor::new()),
            FramingMode::Numeric => Self::Numeric(NumericExtractor::new()),
        }
    }

    pub fn mode(&self) -> FramingMode {
        match self {
            Self::Marker(_) => FramingMode::Marker,
            Self::Numeric(_) => FramingMode::Numeric,
        }
    }
}

impl FrameExtractor for Extractor {
    fn push(&mut self, byte: u8) -> Option<SensorFrame> {
        match self {
            Self::Marker(x) => x.push(byte),
            Self::Numeric(x) => x.push(byte),
        }
    }

    fn reset(&mut self) {
        match self {
            Self::Marker(x) => x.reset(),
            Self::Numeric(x) => x.reset(),
        }
    }
}
