//! # maglib -- magnetic stripe reader/writer control
//!
//! `maglib` is a synchronous Rust library for driving MSR605-family
//! magnetic stripe card reader/writers, over either the MSR605's serial
//! line or the MSR605X's USB HID link. It covers the full device surface:
//! reset, coercivity selection, erase, track read/write in ASCII and raw
//! data modes, and the ISO 7811 density codec for converting raw track
//! bytes to and from printable text.
//!
//! ## Quick Start
//!
//! ```no_run
//! use maglib::{DataMode, Track};
//! use maglib::msr::MsrBuilder;
//!
//! fn main() -> maglib::Result<()> {
//!     let mut msr = MsrBuilder::new()
//!         .serial_port("/dev/ttyUSB0")
//!         .mode(DataMode::Ascii)
//!         .build()?;
//!
//!     msr.reset()?;
//!     let card = msr.read()?;
//!     println!("track 1: {}", String::from_utf8_lossy(card.track(Track::One)));
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized as a workspace of focused crates:
//!
//! | Crate                 | Purpose                                         |
//! |-----------------------|-------------------------------------------------|
//! | `maglib-core`         | [`Transport`] trait, types, errors, ISO 7811 codec, format conversion |
//! | `maglib-transport`    | Serial and USB HID transport implementations    |
//! | `maglib-msr`          | MSR605 command protocol driver                  |
//! | `maglib-test-harness` | Mock transport for deterministic tests          |
//! | **`maglib`**          | This facade crate -- re-exports everything      |
//!
//! The driver operates on the [`Transport`] trait, so application code can
//! swap the serial port, the HID link, or a mock without touching protocol
//! logic.
//!
//! ## Feature Flags
//!
//! | Feature  | Enables                              | Default |
//! |----------|--------------------------------------|---------|
//! | `serial` | [`transport::SerialTransport`]       | yes     |
//! | `hid`    | [`transport::HidTransport`] + framing | yes    |

pub use maglib_core::*;

/// Transport implementations (serial port and USB HID packet framing).
pub mod transport {
    pub use maglib_transport::*;
}

/// MSR605 protocol driver.
///
/// Provides [`MsrDevice`](msr::MsrDevice) and
/// [`MsrBuilder`](msr::MsrBuilder) plus the pure protocol modules
/// (command builders, status decoding, the track-read state machine).
pub mod msr {
    pub use maglib_msr::*;
}
