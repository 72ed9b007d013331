//! Unified error types for the greenhouse controller.
//!
//! Only device-level failures surface as errors. Malformed frames are
//! internal extractor resets and never leave the framing layer; missed
//! intermediate commands are the documented last-write-wins behaviour of
//! the intake, not a failure.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level controller error
// ---------------------------------------------------------------------------

/// Every fallible operation in the control core funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The device link could not be opened at startup. Fatal, never retried.
    LinkOpen(String),
    /// A write or read on the open link failed. Terminates the link worker.
    LinkIo(std::io::ErrorKind),
    /// The device returned zero bytes: the stream is closed.
    EndOfStream,
    /// A configuration value failed validation.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LinkOpen(msg) => write!(f, "link open failed: {msg}"),
            Self::LinkIo(kind) => write!(f, "link I/O failed: {kind}"),
            Self::EndOfStream => write!(f, "link closed (end of stream)"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::LinkIo(e.kind())
    }
}

impl Error {
    /// True for errors that end the link worker. A read that timed out or
    /// was interrupted only means no bytes arrived this cycle.
    pub fn is_link_fatal(&self) -> bool {
        match self {
            Self::LinkIo(kind) => !matches!(
                kind,
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::Interrupted
            ),
            Self::LinkOpen(_) | Self::EndOfStream => true,
            Self::Config(_) => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Controller-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
