//! Human-facing track data formats.
//!
//! Callers exchange track data as text in one of three formats; this
//! module validates that text and converts it to and from the bytes that
//! actually cross the wire. In ASCII data mode the wire bytes are the text
//! itself; in raw data mode they are ISO 7811 bit groups (see
//! [`iso7811`](crate::iso7811)).
//!
//! All validation happens here, before any device I/O: malformed input is
//! an [`Error::InvalidParameter`] precondition failure, never a protocol
//! error.

use std::fmt;

use crate::error::{Error, Result};
use crate::iso7811;
use crate::types::{DataMode, Track};

/// Number of logical tracks on a card.
pub const TRACK_COUNT: usize = 3;

/// Delimiter separating per-track fields in line-oriented input/output.
pub const TRACK_DELIMITER: char = '|';

/// A human-facing track data format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// 7-bit clean text, exchanged verbatim in ASCII data mode.
    Ascii,
    /// Hex rendering of the raw wire bytes; lowercase on output, either
    /// case accepted on input.
    Hex,
    /// The track's ISO 7811 alphabet (track 1: space..=`_`,
    /// tracks 2/3: `0`..=`?`), converted through the density codec.
    Iso,
}

impl Format {
    /// The data mode this format needs on the wire.
    ///
    /// Plain ASCII rides the device's ASCII mode; hex and ISO work on the
    /// raw bit groups and therefore need raw mode.
    pub fn implied_mode(self) -> DataMode {
        match self {
            Format::Ascii => DataMode::Ascii,
            Format::Hex | Format::Iso => DataMode::Raw,
        }
    }

    /// Validate `input` against this format's character class for `track`.
    pub fn validate(self, input: &str, track: Track) -> Result<()> {
        match self {
            Format::Ascii => {
                if !input.is_ascii() {
                    return Err(Error::InvalidParameter(format!(
                        "{track} data is not 7-bit clean ASCII"
                    )));
                }
            }
            Format::Hex => {
                if !input.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(Error::InvalidParameter(format!(
                        "{track} data contains a non-hex character"
                    )));
                }
                if input.len() % 2 != 0 {
                    return Err(Error::InvalidParameter(format!(
                        "{track} hex data has odd length {}",
                        input.len()
                    )));
                }
            }
            Format::Iso => {
                let (low, high) = iso7811::alphabet(track);
                if let Some(c) = input.chars().find(|&c| c < low || c > high) {
                    return Err(Error::InvalidParameter(format!(
                        "{track} data contains {c:?}, outside the ISO alphabet \
                         ({low:?}..={high:?})"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Format::Ascii => "ascii",
            Format::Hex => "hex",
            Format::Iso => "iso",
        };
        write!(f, "{s}")
    }
}

/// Convert text in `format` into the wire bytes for `track`.
///
/// Validates first; nothing reaches the device if the input is malformed.
pub fn to_raw(format: Format, input: &str, track: Track) -> Result<Vec<u8>> {
    format.validate(input, track)?;
    match format {
        Format::Ascii => Ok(input.as_bytes().to_vec()),
        Format::Hex => hex::decode(input)
            .map_err(|e| Error::InvalidParameter(format!("{track} hex data: {e}"))),
        Format::Iso => iso7811::decode(input, track),
    }
}

/// Render the wire bytes of `track` as text in `format`.
pub fn from_raw(format: Format, raw: &[u8], track: Track) -> Result<String> {
    match format {
        Format::Ascii => {
            if !raw.is_ascii() {
                return Err(Error::InvalidParameter(format!(
                    "{track} data is not 7-bit clean ASCII"
                )));
            }
            Ok(String::from_utf8_lossy(raw).into_owned())
        }
        Format::Hex => Ok(hex::encode(raw)),
        Format::Iso => Ok(iso7811::encode(raw, track)),
    }
}

/// Split a `|`-delimited input line into its three per-track fields.
///
/// A write request must name all three tracks, so exactly two delimiters
/// are required; anything else is rejected before any device I/O.
pub fn split_tracks(input: &str) -> Result<[&str; TRACK_COUNT]> {
    let fields: Vec<&str> = input.split(TRACK_DELIMITER).collect();
    if fields.len() != TRACK_COUNT {
        return Err(Error::InvalidParameter(format!(
            "expected exactly {} {:?} delimiters separating {} tracks, found {}",
            TRACK_COUNT - 1,
            TRACK_DELIMITER,
            TRACK_COUNT,
            fields.len() - 1,
        )));
    }
    Ok([fields[0], fields[1], fields[2]])
}

/// Join three per-track output fields with the track delimiter.
pub fn join_tracks(fields: &[String; TRACK_COUNT]) -> String {
    let mut out = String::with_capacity(fields.iter().map(String::len).sum::<usize>() + 2);
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(TRACK_DELIMITER);
        }
        out.push_str(field);
    }
    out
}
