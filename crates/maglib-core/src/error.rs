//! Error types for maglib.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. Transport-layer, protocol-layer, and
//! device-reported errors are all captured here.

use std::fmt;

/// The closed set of failure categories the device itself can report.
///
/// Every erase/read/write command is answered with a one-byte status;
/// these are the documented non-success codes. Anything outside this set
/// is a protocol-level anomaly, not a device error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceErrorKind {
    /// Status `'1'` -- the device failed to read from or write to the stripe.
    ReadWrite,
    /// Status `'2'` or `'4'` -- the device rejected the command or its data.
    Command,
    /// Status `'9'` -- the card swipe failed or no card was swiped.
    Swipe,
    /// Status `'A'` -- the erase operation failed.
    Erase,
}

impl fmt::Display for DeviceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeviceErrorKind::ReadWrite => "read/write",
            DeviceErrorKind::Command => "command",
            DeviceErrorKind::Swipe => "swipe",
            DeviceErrorKind::Erase => "erase",
        };
        write!(f, "{s}")
    }
}

/// The error type for all maglib operations.
///
/// Variants cover the full range of failure modes encountered when
/// communicating with a card reader/writer: physical transport failures,
/// protocol decode errors, device-reported failures, timeouts, and bad
/// caller input. Neither [`Protocol`](Error::Protocol) nor
/// [`Device`](Error::Device) is retriable at this level -- the caller
/// decides whether to retry an entire operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport-level error (serial port, USB HID).
    #[error("transport error: {0}")]
    Transport(String),

    /// The byte stream from the device does not match what the protocol
    /// expects: wrong echoed bytes, an unrecognized status byte, or
    /// malformed track-read framing. The message carries the expected vs.
    /// actual bytes in hex for diagnosis.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The device explicitly reported one of its known failure categories.
    #[error("device reported {0} error")]
    Device(DeviceErrorKind),

    /// Timed out waiting for data from the device.
    #[error("timeout waiting for response")]
    Timeout,

    /// Malformed input was passed to a maglib call. Raised by validation
    /// before any device I/O happens.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// No connection to the device has been established.
    #[error("not connected")]
    NotConnected,

    /// The connection to the device was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
