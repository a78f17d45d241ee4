//! Transport trait for device communication.
//!
//! The [`Transport`] trait abstracts over the physical link to a card
//! reader/writer. Implementations exist for serial ports (MSR605), USB HID
//! (MSR605X), and mock transports for testing.
//!
//! The protocol driver in `maglib-msr` operates on a `Transport` rather
//! than directly on a serial port, enabling both real hardware control and
//! deterministic unit testing with `MockTransport` from the
//! `maglib-test-harness` crate.
//!
//! The whole stack is synchronous: a device is driven by exactly one
//! caller at a time and every operation runs send-then-blocking-read to
//! completion, so there is no async runtime anywhere.

use std::time::Duration;

use crate::error::Result;

/// Synchronous byte-level transport to a card reader/writer.
///
/// Implementations handle chunking and buffering at the physical layer
/// (the HID transport reassembles 64-byte packets into messages behind
/// this interface). Protocol-level concerns -- command framing, status
/// decoding, track parsing -- belong to the driver that consumes the
/// trait.
pub trait Transport: Send {
    /// Send raw bytes to the device.
    ///
    /// Blocks until all bytes have been handed to the underlying transport
    /// (serial TX buffer, HID report pipe) and flushed.
    fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive bytes from the device into the provided buffer.
    ///
    /// Returns the number of bytes actually read, which may be less than
    /// `buf.len()`; any bytes beyond the caller's buffer stay queued for
    /// the next call. Waits up to `timeout` for data to arrive and returns
    /// [`Error::Timeout`](crate::error::Error::Timeout) if nothing is
    /// received within the deadline.
    fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Close the transport connection.
    ///
    /// After calling `close()`, subsequent `send()` and `receive()` calls
    /// should return [`Error::NotConnected`](crate::error::Error::NotConnected).
    fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently connected.
    fn is_connected(&self) -> bool;
}
