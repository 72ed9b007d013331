//! USB serial transport to the sensor/relay board.
//!
//! Fixed line settings (8N1) at the configured baud rate, matching the
//! board firmware. The port is opened once; failure to open is fatal.
//! Reads time out after [`READ_POLL`] so a silent board still lets the
//! link worker enforce the pump runtime limit.

use core::time::Duration;
use std::io::{ErrorKind, Read, Write};

use log::info;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};

use crate::config::ControllerConfig;
use crate::error::{Error, Result};
use crate::link::transport::Transport;

/// Longest a read blocks before reporting `TimedOut`.
const READ_POLL: Duration = Duration::from_millis(500);

pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Open the configured device.
    pub fn open(config: &ControllerConfig) -> Result<Self> {
        let port = serialport::new(config.device_path.as_str(), config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(READ_POLL)
            .open()
            .map_err(|e| Error::LinkOpen(format!("{}: {}", config.device_path, e)))?;
        info!(
            "serial link open on {} at {} baud",
            config.device_path, config.baud_rate
        );
        Ok(Self { port })
    }
}

impl Transport for SerialTransport {
    type Error = std::io::Error;

    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        loop {
            match self.port.read(buf) {
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                other => return other,
            }
        }
    }

    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.port.write(data)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.port.flush()
    }
}
