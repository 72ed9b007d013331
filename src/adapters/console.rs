//! Line-oriented command source.
//!
//! Accepts one command per line, e.g. from stdin:
//!
//! ```text
//! light on | light off
//! pump on  | pump off
//! threshold 320
//! ```

use crate::app::commands::Command;
use crate::relay::RelayCommand;

/// Parse one console line. Case-insensitive; extra whitespace ignored.
pub fn parse_command(line: &str) -> Result<Command, &'static str> {
    let mut words = line.split_whitespace();
    let verb = words.next().ok_or("empty command")?.to_ascii_lowercase();
    let arg = words.next().ok_or("missing argument")?;
    if words.next().is_some() {
        return Err("too many arguments");
    }
    match verb.as_str() {
        "light" => Ok(RelayCommand::SetLight(parse_switch(arg)?).into()),
        "pump" => Ok(RelayCommand::SetPump(parse_switch(arg)?).into()),
        "threshold" => arg
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Command::SetHumidityThreshold)
            .ok_or("threshold must be a number"),
        _ => Err("unknown command"),
    }
}

fn parse_switch(arg: &str) -> Result<bool, &'static str> {
    match arg.to_ascii_lowercase().as_str() {
        "on" | "1" => Ok(true),
        "off" | "0" => Ok(false),
        _ => Err("expected on or off"),
    }
}
