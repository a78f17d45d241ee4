//! maglib-msr: MSR605 command protocol driver.
//!
//! Implements the escape-prefixed MSR605 serial command set on top of any
//! [`Transport`](maglib_core::Transport): reset, coercivity selection,
//! erase, read (with the track-parsing state machine), write, and the
//! firmware/raw auxiliary commands. The same byte stream drives the
//! MSR605X through the HID transport in `maglib-transport`.
//!
//! The split mirrors the rest of the workspace:
//!
//! - [`protocol`] -- wire constants and status decoding (pure)
//! - [`commands`] -- command byte builders (pure)
//! - [`reader`] -- the track-read state machine (pure)
//! - [`device`] / [`builder`] -- the driver that moves bytes

pub mod builder;
pub mod commands;
pub mod device;
pub mod protocol;
pub mod reader;

pub use builder::MsrBuilder;
pub use device::MsrDevice;
pub use reader::TrackReader;
