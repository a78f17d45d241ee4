//! MSR605 wire protocol constants and status decoding.
//!
//! The MSR605 command set is escape-prefixed: every command starts with
//! `ESC` (0x1B) followed by a single letter and optional parameter bytes,
//! and every status-bearing exchange ends with `ESC` plus one status byte.
//! The MSR605X speaks the identical byte stream, tunneled through HID
//! packets by `maglib-transport`.
//!
//! # Command reference
//!
//! | Bytes            | Meaning                      |
//! |------------------|------------------------------|
//! | `ESC 'a'`        | reset                        |
//! | `ESC 'x'`        | high coercivity              |
//! | `ESC 'y'`        | low coercivity               |
//! | `ESC 'c' <mask>` | erase selected tracks        |
//! | `ESC 'r'`        | read, ASCII data mode        |
//! | `ESC 'm'`        | read, raw data mode          |
//! | `ESC 'w' ESC 's'`| write preamble, ASCII mode   |
//! | `ESC 'n' ESC 's'`| write preamble, raw mode     |
//! | `ESC 'v'`        | firmware version query       |
//! | `'?' FS`         | end-of-data terminator       |

use maglib_core::error::{DeviceErrorKind, Error, Result};

/// Escape byte prefixing every command and the status response.
pub const ESC: u8 = 0x1B;

/// File separator closing the data section of read/write exchanges.
pub const FS: u8 = 0x1C;

/// End-of-data marker preceding [`FS`], and the per-track data terminator
/// inside read replies.
pub const END_OF_DATA: u8 = b'?';

/// `ESC 's'` -- echoed by the device when a read reply starts; also the
/// tail of the write preamble.
pub const DATA_START: &[u8] = &[ESC, b's'];

/// Success status byte.
pub const STATUS_OK: u8 = b'0';

/// Track-delimiter padding inside read replies (`%` opens track 1, `;`
/// opens tracks 2 and 3 on the stripe itself); skipped, never stored.
pub fn is_padding(byte: u8) -> bool {
    byte == b'%' || byte == b';'
}

/// Decode the one-byte status that follows erase/read/write commands.
///
/// `'0'` is success; the documented error codes map to their
/// [`DeviceErrorKind`] category; any other byte is a protocol-level
/// anomaly, reported with the offending byte in hex for diagnosis.
pub fn decode_status(status: u8) -> Result<()> {
    match status {
        STATUS_OK => Ok(()),
        b'1' => Err(Error::Device(DeviceErrorKind::ReadWrite)),
        b'2' | b'4' => Err(Error::Device(DeviceErrorKind::Command)),
        b'9' => Err(Error::Device(DeviceErrorKind::Swipe)),
        b'A' => Err(Error::Device(DeviceErrorKind::Erase)),
        other => Err(Error::Protocol(format!("invalid status byte 0x{other:02x}"))),
    }
}
