//! Application core — control-loop domain logic, zero I/O.
//!
//! This module holds the rules of the greenhouse controller: how relay
//! commands change the relay state, when a watering session starts or is
//! forced to end, and what gets broadcast. All interaction with the
//! device, the countdown workers and the subscribers happens through
//! **port traits** defined in [`ports`], keeping this layer testable
//! without a board attached.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
