//! Greenhouse controller library.
//!
//! Talks to a sensor/relay board over a byte link: extracts humidity
//! frames from the stream, keeps the light and pump relays in sync,
//! bounds every watering session with a safety timer and fans readings
//! out to subscribers. The serial adapter is behind the `serial` feature;
//! everything else is pure logic and runs under test with in-memory links.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod broadcast;
pub mod config;
pub mod control;
pub mod error;
pub mod framing;
pub mod link;
pub mod relay;
pub mod safety;
pub mod status;

pub use error::{Error, Result};
