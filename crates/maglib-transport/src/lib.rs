//! Transport implementations for maglib.
//!
//! This crate provides concrete implementations of the
//! [`Transport`](maglib_core::Transport) trait from `maglib-core` for the
//! two physical connection types of the MSR605 family:
//!
//! - [`SerialTransport`]: the MSR605's RS-232 / USB virtual COM port link
//!   (`serial` feature)
//! - [`HidTransport`]: the MSR605X's USB HID link, including the 64-byte
//!   packet framing in [`framing`] (`hid` feature)
//!
//! # Example
//!
//! ```no_run
//! use maglib_transport::SerialTransport;
//! use maglib_core::transport::Transport;
//! use std::time::Duration;
//!
//! # fn example() -> maglib_core::Result<()> {
//! let mut transport = SerialTransport::open("/dev/ttyUSB0")?;
//! transport.send(&[0x1B, b'a'])?;
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "hid")]
pub mod framing;
#[cfg(feature = "hid")]
pub mod hid;
#[cfg(feature = "serial")]
pub mod serial;

#[cfg(feature = "hid")]
pub use hid::{HidTransport, MSR605X_PID, MSR605X_VID};
#[cfg(feature = "serial")]
pub use serial::{DataBits, FlowControl, Parity, SerialConfig, SerialTransport, StopBits};
