//! Rolling window of recent humidity readings.
//!
//! Fixed capacity; the oldest reading is overwritten once full. The average
//! covers only the readings actually held, so it is meaningful from the
//! first reading on.

use heapless::HistoryBuffer;

/// Readings kept in the window.
pub const WINDOW_LEN: usize = 8;

#[derive(Debug, Default)]
pub struct HumidityWindow {
    readings: HistoryBuffer<f32, WINDOW_LEN>,
}

impl HumidityWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, reading: f32) {
        self.readings.write(reading);
    }

    pub fn latest(&self) -> Option<f32> {
        self.readings.recent().copied()
    }

    pub fn average(&self) -> Option<f32> {
        let held = self.readings.as_slice();
        if held.is_empty() {
            return None;
        }
        Some(held.iter().sum::<f32>() / held.len() as f32)
    }
}
