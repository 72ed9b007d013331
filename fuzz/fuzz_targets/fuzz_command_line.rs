//! Fuzz target: console command parser.
//!
//! cargo fuzz run fuzz_command_line

#![no_main]

use greenhouse::adapters::console::parse_command;
use greenhouse::app::commands::Command;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(line) = core::str::from_utf8(data) {
        if let Ok(Command::SetHumidityThreshold(v)) = parse_command(line) {
            assert!(v.is_finite(), "parser must reject non-finite thresholds");
        }
    }
});
