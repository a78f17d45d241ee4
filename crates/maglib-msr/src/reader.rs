//! Track-read state machine.
//!
//! A read reply interleaves all three tracks: each track opens with
//! `ESC <track#>`, its bytes follow (with `%`/`;` delimiter padding mixed
//! in), and `'?'` closes it. `'?' FS` at the top level ends the data
//! section, after which `ESC <status>` reports the outcome.
//!
//! [`TrackReader`] consumes that stream one byte at a time with no
//! backtracking. The driver feeds it from batched transport reads; the
//! parser itself never touches I/O, so every transition is unit-testable.
//! Any byte that does not fit the grammar is a protocol error -- unknown
//! bytes are never silently dropped.

use maglib_core::error::{Error, Result};
use maglib_core::types::CardData;

use crate::protocol::{self, END_OF_DATA, ESC, FS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Between tracks: expecting `ESC` (new track) or `'?'` (end of data).
    AwaitingStart,
    /// `ESC` seen at the top level; expecting a track number.
    TrackStart,
    /// Collecting data bytes for the track at this 0-based index.
    InTrack(usize),
    /// `ESC` seen inside track data; expecting the next track's number.
    TrackSwitch,
    /// `'?'` seen at the top level; expecting `FS`.
    EndOfData,
    /// Expecting the `ESC` that precedes the status byte.
    StatusEscape,
    /// Expecting the status byte itself.
    StatusByte,
    /// Terminal state; the reply has been fully consumed.
    Done,
}

/// Incremental parser for the track-read reply stream.
#[derive(Debug)]
pub struct TrackReader {
    state: State,
    tracks: CardData,
}

impl TrackReader {
    pub fn new() -> Self {
        TrackReader {
            state: State::AwaitingStart,
            tracks: CardData::default(),
        }
    }

    /// Feed one byte of the reply stream.
    ///
    /// Returns `Ok(true)` once the terminal state is reached, i.e. a
    /// successful status byte has been consumed. A device-reported failure
    /// or a byte that does not fit the grammar surfaces as an error.
    pub fn push(&mut self, byte: u8) -> Result<bool> {
        self.state = match self.state {
            State::AwaitingStart => match byte {
                ESC => State::TrackStart,
                END_OF_DATA => State::EndOfData,
                other => return Err(unexpected(other, "a track start or end of data")),
            },
            State::TrackStart | State::TrackSwitch => match byte {
                n @ 1..=3 => State::InTrack(n as usize - 1),
                other => return Err(unexpected(other, "a track number")),
            },
            State::InTrack(index) => match byte {
                ESC => State::TrackSwitch,
                END_OF_DATA => State::AwaitingStart,
                b if protocol::is_padding(b) => State::InTrack(index),
                data => {
                    self.tracks.tracks[index].push(data);
                    State::InTrack(index)
                }
            },
            State::EndOfData => match byte {
                FS => State::StatusEscape,
                other => return Err(unexpected(other, "the FS terminator")),
            },
            State::StatusEscape => match byte {
                ESC => State::StatusByte,
                other => return Err(unexpected(other, "the status escape")),
            },
            State::StatusByte => {
                protocol::decode_status(byte)?;
                State::Done
            }
            State::Done => {
                return Err(Error::Protocol(
                    "byte pushed after the read reply completed".into(),
                ))
            }
        };
        Ok(self.state == State::Done)
    }

    /// The collected tracks; meaningful once [`push`](Self::push) has
    /// returned `Ok(true)`.
    pub fn into_tracks(self) -> CardData {
        self.tracks
    }
}

impl Default for TrackReader {
    fn default() -> Self {
        Self::new()
    }
}

fn unexpected(byte: u8, wanted: &str) -> Error {
    Error::Protocol(format!(
        "unexpected byte 0x{byte:02x} while expecting {wanted}"
    ))
}
