//! maglib-core: Core traits, types, and error definitions for maglib.
//!
//! This crate defines the device-agnostic abstractions the rest of the
//! workspace builds on. Applications depend on these types without pulling
//! in a concrete transport or protocol driver.
//!
//! # Key items
//!
//! - [`Transport`] -- synchronous byte-level communication channel
//! - [`Error`] / [`Result`] -- error handling
//! - [`Track`], [`TrackSelection`], [`DataMode`], [`Coercivity`],
//!   [`CardData`] -- the magstripe vocabulary
//! - [`iso7811`] -- the per-track density codec
//! - [`convert`] -- human-facing format validation and conversion

pub mod convert;
pub mod error;
pub mod iso7811;
pub mod transport;
pub mod types;

// Re-export key types at crate root for ergonomic `use maglib_core::*`.
pub use convert::Format;
pub use error::{DeviceErrorKind, Error, Result};
pub use transport::Transport;
pub use types::{CardData, Coercivity, DataMode, ParseTrackSelectionError, Track, TrackSelection};
