//! MsrBuilder -- fluent builder for constructing [`MsrDevice`] instances.
//!
//! Separates configuration from construction so that callers can choose
//! the data mode and timeout policy before the transport connection is
//! established. There is no process-wide device or mode state anywhere:
//! everything a device handle needs travels through the builder.
//!
//! # Example
//!
//! ```no_run
//! use maglib_msr::MsrBuilder;
//! use maglib_core::DataMode;
//! use std::time::Duration;
//!
//! # fn example() -> maglib_core::Result<()> {
//! let mut msr = MsrBuilder::new()
//!     .serial_port("/dev/ttyUSB0")
//!     .mode(DataMode::Raw)
//!     .command_timeout(Duration::from_secs(10))
//!     .build()?;
//! msr.reset()?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use maglib_core::error::{Error, Result};
use maglib_core::transport::Transport;
use maglib_core::types::DataMode;

use crate::device::MsrDevice;

/// Fluent builder for [`MsrDevice`].
pub struct MsrBuilder {
    serial_port: Option<String>,
    mode: DataMode,
    command_timeout: Duration,
}

impl MsrBuilder {
    /// Create a builder with the defaults: ASCII data mode and a 30 second
    /// command timeout.
    ///
    /// The timeout is generous because read and write replies arrive only
    /// after a human swipes a card.
    pub fn new() -> Self {
        MsrBuilder {
            serial_port: None,
            mode: DataMode::Ascii,
            command_timeout: Duration::from_secs(30),
        }
    }

    /// Set the serial port path (e.g. `/dev/ttyUSB0` or `COM3`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Set the data mode for read and write operations.
    pub fn mode(mut self, mode: DataMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set how long to wait for a reply to a single command, including the
    /// wait for a card swipe (default: 30s).
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Build an [`MsrDevice`] with a caller-provided transport.
    ///
    /// This is the entry point for testing (pass a `MockTransport` from
    /// `maglib-test-harness`), for the MSR605X's HID transport, and for
    /// any other case where the caller manages the transport itself.
    pub fn build_with_transport(self, transport: Box<dyn Transport>) -> MsrDevice {
        MsrDevice::new(transport, self.mode, self.command_timeout)
    }

    /// Build an [`MsrDevice`] over a serial transport.
    ///
    /// Requires that [`serial_port()`](Self::serial_port) has been called;
    /// the port is opened with the device's fixed 9600 8N1 settings.
    pub fn build(self) -> Result<MsrDevice> {
        let port = self.serial_port.as_ref().ok_or_else(|| {
            Error::InvalidParameter("serial_port is required for build()".into())
        })?;
        let transport = maglib_transport::SerialTransport::open(port)?;
        Ok(self.build_with_transport(Box::new(transport)))
    }
}

impl Default for MsrBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maglib_test_harness::MockTransport;

    #[test]
    fn builder_defaults() {
        let msr = MsrBuilder::new().build_with_transport(Box::new(MockTransport::new()));
        assert_eq!(msr.data_mode(), DataMode::Ascii);
    }

    #[test]
    fn builder_custom_settings() {
        let msr = MsrBuilder::new()
            .serial_port("/dev/ttyUSB0")
            .mode(DataMode::Raw)
            .command_timeout(Duration::from_millis(200))
            .build_with_transport(Box::new(MockTransport::new()));
        assert_eq!(msr.data_mode(), DataMode::Raw);
    }

    #[test]
    fn builder_serial_port_required_for_build() {
        let result = MsrBuilder::new().build();
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }
}
