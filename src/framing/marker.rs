//! Marker-delimited frames: `{` opens, `}` closes.
//!
//! A `{` always discards whatever was being assembled and starts over, so
//! a device reset mid-frame simply loses the truncated frame. Bytes seen
//! while no frame is open are ignored.

use log::debug;

use super::{Dialect, FrameBytes, FrameExtractor, SensorFrame};

const START: u8 = b'{';
const END: u8 = b'}';

#[derive(Debug, Default)]
pub struct MarkerExtractor {
    buf: FrameBytes,
    open: bool,
}

impl MarkerExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a frame is being assembled.
    pub fn in_frame(&self) -> bool {
        self.open
    }
}

impl FrameExtractor for MarkerExtractor {
    fn push(&mut self, byte: u8) -> Option<SensorFrame> {
        if byte == START {
            self.buf.clear();
            self.open = self.buf.push(START).is_ok();
            return None;
        }
        if !self.open {
            return None;
        }
        if self.buf.push(byte).is_err() {
            debug!("marker frame exceeds {} bytes, dropped", self.buf.capacity());
            self.reset();
            return None;
        }
        if byte == END {
            self.open = false;
            return Some(SensorFrame::new(
                Dialect::Marker,
                core::mem::take(&mut self.buf),
            ));
        }
        None
    }

    fn reset(&mut self) {
        self.buf.clear();
        self.open = false;
    }
}
