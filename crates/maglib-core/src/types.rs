//! Core types used throughout maglib.
//!
//! These types describe the stable vocabulary of the MSR605 family:
//! tracks, track selections, data modes, coercivity, and card contents.
//! None of them perform I/O.

use std::fmt;
use std::str::FromStr;

/// One of the three logical tracks on a magnetic stripe.
///
/// Tracks are addressed 1-based on the wire; [`Track::index`] gives the
/// 0-based position into per-track arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Track {
    One,
    Two,
    Three,
}

impl Track {
    /// All three tracks in wire order.
    pub const ALL: [Track; 3] = [Track::One, Track::Two, Track::Three];

    /// The 1-based track number as used on the wire.
    pub fn number(self) -> u8 {
        match self {
            Track::One => 1,
            Track::Two => 2,
            Track::Three => 3,
        }
    }

    /// The 0-based index into per-track arrays.
    pub fn index(self) -> usize {
        self.number() as usize - 1
    }

    /// Look up a track by its 1-based wire number.
    pub fn from_number(n: u8) -> Option<Track> {
        match n {
            1 => Some(Track::One),
            2 => Some(Track::Two),
            3 => Some(Track::Three),
            _ => None,
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "track {}", self.number())
    }
}

/// Which tracks an operation applies to.
///
/// Encodes to the erase command's bitmask byte: bit 0 = track 1,
/// bit 1 = track 2, bit 2 = track 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackSelection {
    track1: bool,
    track2: bool,
    track3: bool,
}

impl TrackSelection {
    /// Select no tracks.
    pub fn none() -> Self {
        TrackSelection::default()
    }

    /// Select all three tracks.
    pub fn all() -> Self {
        TrackSelection {
            track1: true,
            track2: true,
            track3: true,
        }
    }

    /// Add a track to the selection.
    pub fn with(mut self, track: Track) -> Self {
        match track {
            Track::One => self.track1 = true,
            Track::Two => self.track2 = true,
            Track::Three => self.track3 = true,
        }
        self
    }

    /// Whether the given track is selected.
    pub fn contains(self, track: Track) -> bool {
        match track {
            Track::One => self.track1,
            Track::Two => self.track2,
            Track::Three => self.track3,
        }
    }

    /// The wire bitmask byte for the erase command.
    pub fn mask(self) -> u8 {
        (self.track1 as u8) | (self.track2 as u8) << 1 | (self.track3 as u8) << 2
    }
}

/// Error returned when a string cannot be parsed into a [`TrackSelection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTrackSelectionError(String);

impl fmt::Display for ParseTrackSelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid track list {:?}: provide track numbers 1-3 separated with commas, e.g. 1,3",
            self.0
        )
    }
}

impl std::error::Error for ParseTrackSelectionError {}

impl FromStr for TrackSelection {
    type Err = ParseTrackSelectionError;

    /// Parse a comma-separated track list such as `"1,3"`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut selection = TrackSelection::none();
        for part in s.split(',') {
            let n: u8 = part
                .trim()
                .parse()
                .map_err(|_| ParseTrackSelectionError(s.to_string()))?;
            let track = Track::from_number(n).ok_or_else(|| ParseTrackSelectionError(s.to_string()))?;
            selection = selection.with(track);
        }
        Ok(selection)
    }
}

/// How track data crosses the wire.
///
/// In ASCII mode the device exchanges printable text; in raw mode it
/// exchanges the ISO 7811 bit groups directly (see
/// [`iso7811`](crate::iso7811)).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataMode {
    /// Printable ASCII track data.
    Ascii,
    /// Raw bit-group track data, with per-track length bytes on write.
    Raw,
}

/// Coercivity setting of the writer.
///
/// A magnetic property of the stripe, not a data value: high-coercivity
/// cards need a stronger write field. This is a device mode toggled by a
/// dedicated command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercivity {
    High,
    Low,
}

/// The contents of all three tracks as returned by a read.
///
/// Bytes are in the wire representation of the data mode the read was
/// issued in; use [`convert`](crate::convert) to render them as ASCII,
/// hex, or ISO text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardData {
    /// Per-track byte buffers, indexed by [`Track::index`].
    pub tracks: [Vec<u8>; 3],
}

impl CardData {
    /// The bytes of one track.
    pub fn track(&self, track: Track) -> &[u8] {
        &self.tracks[track.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_numbers_are_one_based() {
        assert_eq!(Track::One.number(), 1);
        assert_eq!(Track::Two.number(), 2);
        assert_eq!(Track::Three.number(), 3);
        assert_eq!(Track::One.index(), 0);
        assert_eq!(Track::Three.index(), 2);
    }

    #[test]
    fn track_from_number() {
        assert_eq!(Track::from_number(1), Some(Track::One));
        assert_eq!(Track::from_number(3), Some(Track::Three));
        assert_eq!(Track::from_number(0), None);
        assert_eq!(Track::from_number(4), None);
    }

    #[test]
    fn track_display() {
        assert_eq!(Track::Two.to_string(), "track 2");
    }

    #[test]
    fn selection_mask_layout() {
        assert_eq!(TrackSelection::none().mask(), 0b000);
        assert_eq!(TrackSelection::all().mask(), 0b111);
        assert_eq!(TrackSelection::none().with(Track::One).mask(), 0b001);
        assert_eq!(TrackSelection::none().with(Track::Two).mask(), 0b010);
        assert_eq!(TrackSelection::none().with(Track::Three).mask(), 0b100);
        assert_eq!(
            TrackSelection::none().with(Track::One).with(Track::Three).mask(),
            0b101
        );
    }

    #[test]
    fn selection_contains() {
        let sel = TrackSelection::none().with(Track::Two);
        assert!(!sel.contains(Track::One));
        assert!(sel.contains(Track::Two));
        assert!(!sel.contains(Track::Three));
    }

    #[test]
    fn selection_parse() {
        let sel: TrackSelection = "1,3".parse().unwrap();
        assert_eq!(sel.mask(), 0b101);

        let all: TrackSelection = "1,2,3".parse().unwrap();
        assert_eq!(all, TrackSelection::all());

        let spaced: TrackSelection = " 2 ".parse().unwrap();
        assert_eq!(spaced.mask(), 0b010);
    }

    #[test]
    fn selection_parse_rejects_bad_input() {
        assert!("0".parse::<TrackSelection>().is_err());
        assert!("4".parse::<TrackSelection>().is_err());
        assert!("1,x".parse::<TrackSelection>().is_err());
        assert!("".parse::<TrackSelection>().is_err());
    }

    #[test]
    fn card_data_track_accessor() {
        let mut card = CardData::default();
        card.tracks[1] = b"3141".to_vec();
        assert_eq!(card.track(Track::Two), b"3141");
        assert!(card.track(Track::One).is_empty());
    }
}
