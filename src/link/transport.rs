//! Transport abstraction — the byte-oriented device link.
//!
//! Concrete implementations:
//! - USB serial to the sensor/relay board
//!   ([`SerialTransport`](crate::adapters::serial::SerialTransport))
//! - scripted in-memory links in tests
//!
//! The link worker is generic over `Transport`, so adding a new link
//! requires zero changes to the control loop.

use crate::error::Error;

/// Byte-oriented duplex link.
pub trait Transport {
    /// Error type for this transport.
    type Error: core::fmt::Debug + Into<Error>;

    /// Read up to `buf.len()` bytes into `buf`, blocking until at least one
    /// byte is available or the link's read timeout elapses. Returns the
    /// number of bytes read; `0` means the device closed the stream. A
    /// timeout is reported as an error of kind `TimedOut`, which the worker
    /// treats as an empty cycle.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write `data` to the link.
    /// Returns the number of bytes actually written.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Flush any buffered output.
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// Write all of `data`, treating a zero-length write as a closed link.
pub fn write_all<T: Transport>(transport: &mut T, mut data: &[u8]) -> Result<(), Error> {
    while !data.is_empty() {
        match transport.write(data).map_err(Into::<Error>::into)? {
            0 => return Err(Error::LinkIo(std::io::ErrorKind::WriteZero)),
            n => data = &data[n..],
        }
    }
    transport.flush().map_err(Into::<Error>::into)
}
