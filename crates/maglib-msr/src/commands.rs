//! MSR605 command builders.
//!
//! Pure functions producing the exact byte sequences of the MSR605
//! programmer's manual, section 6. No I/O happens here; the caller is
//! responsible for sending the bytes over a transport and feeding the
//! replies back into the parsers.

use bytes::{BufMut, BytesMut};
use maglib_core::types::{Coercivity, DataMode, Track, TrackSelection};

use crate::protocol::{END_OF_DATA, ESC, FS};

/// Assemble `ESC <letter> <params...>`.
fn escape_command(letter: u8, params: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(2 + params.len());
    buf.put_u8(ESC);
    buf.put_u8(letter);
    buf.put_slice(params);
    buf.to_vec()
}

/// Build the reset command (`ESC 'a'`). The device does not reply.
pub fn cmd_reset() -> Vec<u8> {
    escape_command(b'a', &[])
}

/// Build a coercivity mode command: `ESC 'x'` for high, `ESC 'y'` for low.
pub fn cmd_set_coercivity(coercivity: Coercivity) -> Vec<u8> {
    match coercivity {
        Coercivity::High => escape_command(b'x', &[]),
        Coercivity::Low => escape_command(b'y', &[]),
    }
}

/// Build an erase command (`ESC 'c' <mask>`).
///
/// The mask byte has bit 0 for track 1, bit 1 for track 2, and bit 2 for
/// track 3. The device answers with a status response.
pub fn cmd_erase(tracks: TrackSelection) -> Vec<u8> {
    escape_command(b'c', &[tracks.mask()])
}

/// Build the read command: `ESC 'r'` in ASCII data mode, `ESC 'm'` in raw.
pub fn cmd_read(mode: DataMode) -> Vec<u8> {
    match mode {
        DataMode::Ascii => escape_command(b'r', &[]),
        DataMode::Raw => escape_command(b'm', &[]),
    }
}

/// Build the write preamble: `ESC 'w' ESC 's'` in ASCII data mode,
/// `ESC 'n' ESC 's'` in raw.
pub fn cmd_write_preamble(mode: DataMode) -> Vec<u8> {
    let letter = match mode {
        DataMode::Ascii => b'w',
        DataMode::Raw => b'n',
    };
    let mut buf = BytesMut::with_capacity(4);
    buf.put_u8(ESC);
    buf.put_u8(letter);
    buf.put_u8(ESC);
    buf.put_u8(b's');
    buf.to_vec()
}

/// Build one track's write frame: `ESC <track#>` followed by the data,
/// with a length byte between them in raw mode only.
///
/// Raw-mode data must fit the one-byte length field; [`MsrDevice`]
/// validates that before building any frames.
///
/// [`MsrDevice`]: crate::device::MsrDevice
pub fn cmd_write_track(track: Track, data: &[u8], mode: DataMode) -> Vec<u8> {
    debug_assert!(mode == DataMode::Ascii || data.len() <= u8::MAX as usize);
    let mut buf = BytesMut::with_capacity(3 + data.len());
    buf.put_u8(ESC);
    buf.put_u8(track.number());
    if mode == DataMode::Raw {
        buf.put_u8(data.len() as u8);
    }
    buf.put_slice(data);
    buf.to_vec()
}

/// Build the end-of-data terminator (`'?' FS`) closing a write sequence.
pub fn cmd_end_of_data() -> Vec<u8> {
    vec![END_OF_DATA, FS]
}

/// Build the firmware version query (`ESC 'v'`). The reply is `ESC`
/// followed by the version text.
pub fn cmd_firmware_version() -> Vec<u8> {
    escape_command(b'v', &[])
}

/// Wrap an arbitrary payload as an escape command (`ESC` + payload).
pub fn cmd_raw(payload: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(1 + payload.len());
    buf.put_u8(ESC);
    buf.put_slice(payload);
    buf.to_vec()
}
