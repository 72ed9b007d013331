//! Sentinel-prefixed fixed-width numeric frames.
//!
//! ```text
//!  ':'  d  d  d  '.'  d  d      → "394.00"
//!   │   └──── 6 accepted ────┘
//!   └─ sentinel (58)
//! ```
//!
//! Inside a capture only ASCII digits and `.` are accepted. Any other byte
//! aborts the capture and nothing is read until the next sentinel. A
//! sentinel in the middle of a capture starts a fresh one.

use super::{Dialect, FrameBytes, FrameExtractor, SensorFrame};

/// Byte that opens a capture.
pub const SENTINEL: u8 = b':';

/// Accepted bytes per frame.
pub const NUMERIC_WIDTH: usize = 6;

#[derive(Debug, Default)]
pub struct NumericExtractor {
    buf: FrameBytes,
    reading: bool,
}

impl NumericExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a capture is active.
    pub fn is_reading(&self) -> bool {
        self.reading
    }
}

impl FrameExtractor for NumericExtractor {
    fn push(&mut self, byte: u8) -> Option<SensorFrame> {
        if byte == SENTINEL {
            self.buf.clear();
            self.reading = true;
            return None;
        }
        if !self.reading {
            return None;
        }
        if !(byte.is_ascii_digit() || byte == b'.') || self.buf.push(byte).is_err() {
            self.reset();
            return None;
        }
        if self.buf.len() == NUMERIC_WIDTH {
            self.reading = false;
            return Some(SensorFrame::new(
                Dialect::Numeric,
                core::mem::take(&mut self.buf),
            ));
        }
        None
    }

    fn reset(&mut self) {
        self.buf.clear();
        self.reading = false;
    }
}
