//! Watering control: the auto-water policy and the rolling humidity window.

pub mod auto_water;
pub mod window;

pub use auto_water::AutoWaterPolicy;
pub use window::HumidityWindow;
