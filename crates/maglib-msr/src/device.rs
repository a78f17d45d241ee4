//! MsrDevice -- the MSR605 protocol driver.
//!
//! This module ties the command builders ([`commands`]) and parsers
//! ([`protocol`], [`reader`]) to a [`Transport`] to produce a working
//! device handle. It owns the transport exclusively: the protocol is
//! strictly request/response, so one `MsrDevice` drives one device and
//! callers serialize their own access.
//!
//! Replies are pulled from the transport in batches into an internal
//! buffer and handed to the parsers byte-by-byte; the driver never issues
//! one-byte transport reads. A transport timeout while bytes are still
//! owed is reported as a protocol error describing the incomplete reply --
//! truncated data is never passed off as a complete response.

use std::time::Duration;

use tracing::{debug, trace};

use maglib_core::error::{Error, Result};
use maglib_core::transport::Transport;
use maglib_core::types::{CardData, Coercivity, DataMode, Track, TrackSelection};

use crate::commands;
use crate::protocol::{self, DATA_START, ESC};
use crate::reader::TrackReader;

/// Largest raw-mode track payload; the length field on the wire is one byte.
const MAX_RAW_TRACK_LEN: usize = u8::MAX as usize;

/// How much to request from the transport in one receive call.
const RECV_CHUNK: usize = 256;

/// How long to wait for further bytes when draining an unframed reply.
const DRAIN_TIMEOUT: Duration = Duration::from_millis(100);

/// A connected MSR605-family card reader/writer.
///
/// Constructed via [`MsrBuilder`](crate::builder::MsrBuilder). All device
/// communication goes through the [`Transport`] provided at build time --
/// a serial port for the MSR605, the HID transport for the MSR605X, or a
/// mock for tests.
pub struct MsrDevice {
    transport: Box<dyn Transport>,
    mode: DataMode,
    command_timeout: Duration,
    /// Bytes received from the transport but not yet consumed by a parser.
    rx_buf: Vec<u8>,
}

impl MsrDevice {
    /// Create a new `MsrDevice` from its constituent parts.
    ///
    /// This is called by [`MsrBuilder`](crate::builder::MsrBuilder);
    /// callers should use the builder API instead.
    pub(crate) fn new(
        transport: Box<dyn Transport>,
        mode: DataMode,
        command_timeout: Duration,
    ) -> Self {
        MsrDevice {
            transport,
            mode,
            command_timeout,
            rx_buf: Vec::new(),
        }
    }

    /// The data mode this device was configured with.
    pub fn data_mode(&self) -> DataMode {
        self.mode
    }

    /// Reset the device to its initial state. No response is expected.
    pub fn reset(&mut self) -> Result<()> {
        debug!("resetting device");
        self.send(&commands::cmd_reset())
    }

    /// Switch the writer between high and low coercivity.
    pub fn set_coercivity(&mut self, coercivity: Coercivity) -> Result<()> {
        debug!(?coercivity, "setting coercivity");
        self.send(&commands::cmd_set_coercivity(coercivity))
    }

    /// Erase the selected tracks, then consume the status response.
    pub fn erase(&mut self, tracks: TrackSelection) -> Result<()> {
        debug!(mask = tracks.mask(), "erasing tracks");
        self.send(&commands::cmd_erase(tracks))?;
        self.read_status()
    }

    /// Read all three tracks.
    ///
    /// Sends the read command for the configured data mode, waits for the
    /// device to see a swipe, and runs the reply through the track-read
    /// state machine. The returned buffers hold the wire bytes of the data
    /// mode; `maglib-core`'s conversion layer renders them as text.
    pub fn read(&mut self) -> Result<CardData> {
        debug!(mode = ?self.mode, "reading card");
        self.send(&commands::cmd_read(self.mode))?;
        self.expect(DATA_START)?;

        let mut reader = TrackReader::new();
        loop {
            let byte = self.read_byte()?;
            if reader.push(byte)? {
                break;
            }
        }
        let card = reader.into_tracks();
        trace!(
            t1 = card.tracks[0].len(),
            t2 = card.tracks[1].len(),
            t3 = card.tracks[2].len(),
            "card read complete"
        );
        Ok(card)
    }

    /// Write tracks to the card, then consume the status response.
    ///
    /// `None` preserves a track -- it is not transmitted at all. The
    /// device then waits for a swipe before answering.
    pub fn write(&mut self, tracks: &[Option<Vec<u8>>; 3]) -> Result<()> {
        if self.mode == DataMode::Raw {
            for (track, data) in Track::ALL.iter().zip(tracks) {
                if let Some(data) = data {
                    if data.len() > MAX_RAW_TRACK_LEN {
                        return Err(Error::InvalidParameter(format!(
                            "{track} data is {} bytes; raw mode carries at most \
                             {MAX_RAW_TRACK_LEN}",
                            data.len()
                        )));
                    }
                }
            }
        }

        debug!(mode = ?self.mode, "writing card");
        self.send(&commands::cmd_write_preamble(self.mode))?;
        for (track, data) in Track::ALL.iter().zip(tracks) {
            if let Some(data) = data {
                self.send(&commands::cmd_write_track(*track, data, self.mode))?;
            }
        }
        self.send(&commands::cmd_end_of_data())?;
        self.read_status()
    }

    /// Query the device firmware revision (`ESC 'v'`; reply `ESC` + text).
    pub fn firmware_version(&mut self) -> Result<String> {
        debug!("querying firmware version");
        self.send(&commands::cmd_firmware_version())?;
        self.expect(&[ESC])?;
        let reply = self.drain()?;
        Ok(String::from_utf8_lossy(&reply).into_owned())
    }

    /// Send an arbitrary escape command (`ESC` + `payload`) and return
    /// whatever comes back before the reply stream goes quiet.
    pub fn raw_command(&mut self, payload: &[u8]) -> Result<Vec<u8>> {
        debug!(bytes = payload.len(), "sending raw command");
        self.send(&commands::cmd_raw(payload))?;
        self.drain()
    }

    /// Tear down the underlying transport.
    pub fn close(&mut self) -> Result<()> {
        self.transport.close()
    }

    // -------------------------------------------------------------------
    // Buffered transport access
    // -------------------------------------------------------------------

    fn send(&mut self, data: &[u8]) -> Result<()> {
        trace!(data = ?data, "send");
        self.transport.send(data)
    }

    /// Pull one batch of bytes from the transport into the receive buffer.
    fn fill(&mut self, timeout: Duration) -> Result<usize> {
        let mut chunk = [0u8; RECV_CHUNK];
        let n = self.transport.receive(&mut chunk, timeout)?;
        self.rx_buf.extend_from_slice(&chunk[..n]);
        Ok(n)
    }

    /// Read exactly `count` bytes, batching transport reads.
    ///
    /// A transport timeout while bytes are still owed becomes a protocol
    /// error: the reply is incomplete, and reporting a short read as
    /// success would silently truncate track data.
    fn read_exact(&mut self, count: usize) -> Result<Vec<u8>> {
        while self.rx_buf.len() < count {
            match self.fill(self.command_timeout) {
                Ok(_) => {}
                Err(Error::Timeout) => {
                    return Err(Error::Protocol(format!(
                        "incomplete response: got {} of {} expected bytes",
                        self.rx_buf.len(),
                        count
                    )));
                }
                Err(e) => return Err(e),
            }
        }
        let rest = self.rx_buf.split_off(count);
        Ok(std::mem::replace(&mut self.rx_buf, rest))
    }

    fn read_byte(&mut self) -> Result<u8> {
        Ok(self.read_exact(1)?[0])
    }

    /// Read whatever the device sends, waiting up to the command timeout
    /// for the first bytes and then until the stream goes quiet.
    fn drain(&mut self) -> Result<Vec<u8>> {
        if self.rx_buf.is_empty() {
            match self.fill(self.command_timeout) {
                Ok(_) | Err(Error::Timeout) => {}
                Err(e) => return Err(e),
            }
        }
        loop {
            match self.fill(DRAIN_TIMEOUT) {
                Ok(0) => break,
                Ok(_) => {}
                Err(Error::Timeout) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(std::mem::take(&mut self.rx_buf))
    }

    /// Read `expected.len()` bytes and require them to match exactly.
    fn expect(&mut self, expected: &[u8]) -> Result<()> {
        let got = self.read_exact(expected.len())?;
        if got != expected {
            return Err(Error::Protocol(format!(
                "expected {}, got {}",
                hex::encode(expected),
                hex::encode(&got)
            )));
        }
        Ok(())
    }

    /// Consume a status response: `ESC` followed by one status byte.
    fn read_status(&mut self) -> Result<()> {
        self.expect(&[ESC])?;
        let status = self.read_byte()?;
        trace!(status = format_args!("0x{status:02x}"), "status byte");
        protocol::decode_status(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maglib_core::error::DeviceErrorKind;
    use maglib_test_harness::MockTransport;

    fn device_with(mock: MockTransport, mode: DataMode) -> MsrDevice {
        MsrDevice::new(Box::new(mock), mode, Duration::from_millis(50))
    }

    #[test]
    fn reset_sends_exact_bytes() {
        let mut mock = MockTransport::new();
        mock.expect(b"\x1ba", b"");
        let mut msr = device_with(mock, DataMode::Ascii);
        msr.reset().unwrap();
    }

    #[test]
    fn coercivity_sends_exact_bytes() {
        let mut mock = MockTransport::new();
        mock.expect(b"\x1bx", b"");
        mock.expect(b"\x1by", b"");
        let mut msr = device_with(mock, DataMode::Ascii);
        msr.set_coercivity(Coercivity::High).unwrap();
        msr.set_coercivity(Coercivity::Low).unwrap();
    }

    #[test]
    fn erase_consumes_success_status() {
        let mut mock = MockTransport::new();
        mock.expect(b"\x1bc\x07", b"\x1b0");
        let mut msr = device_with(mock, DataMode::Ascii);
        msr.erase(TrackSelection::all()).unwrap();
    }

    #[test]
    fn erase_surfaces_device_error() {
        let mut mock = MockTransport::new();
        mock.expect(b"\x1bc\x01", b"\x1bA");
        let mut msr = device_with(mock, DataMode::Ascii);
        let err = msr
            .erase(TrackSelection::none().with(Track::One))
            .unwrap_err();
        assert!(matches!(err, Error::Device(DeviceErrorKind::Erase)));
    }

    #[test]
    fn read_parses_three_tracks() {
        let mut mock = MockTransport::new();
        mock.expect(
            b"\x1br",
            b"\x1bs\x1b\x01%ABC?\x1b\x02;?\x1b\x03;XY??\x1c\x1b0",
        );
        let mut msr = device_with(mock, DataMode::Ascii);
        let card = msr.read().unwrap();
        assert_eq!(card.track(Track::One), b"ABC");
        assert_eq!(card.track(Track::Two), b"");
        assert_eq!(card.track(Track::Three), b"XY");
    }

    #[test]
    fn read_in_raw_mode_sends_raw_command() {
        let mut mock = MockTransport::new();
        mock.expect(b"\x1bm", b"\x1bs\x1b\x01\x41??\x1c\x1b0");
        let mut msr = device_with(mock, DataMode::Raw);
        let card = msr.read().unwrap();
        assert_eq!(card.track(Track::One), b"\x41");
    }

    #[test]
    fn read_rejects_wrong_preamble_echo() {
        let mut mock = MockTransport::new();
        mock.expect(b"\x1br", b"\x1bZ");
        let mut msr = device_with(mock, DataMode::Ascii);
        let err = msr.read().unwrap_err();
        match err {
            Error::Protocol(msg) => {
                assert!(msg.contains("1b73"), "got {msg}");
                assert!(msg.contains("1b5a"), "got {msg}");
            }
            other => panic!("expected Protocol, got {other:?}"),
        }
    }

    #[test]
    fn read_reports_incomplete_reply() {
        let mut mock = MockTransport::new();
        // Reply cut off after the preamble echo and track 1's opening.
        mock.expect(b"\x1br", b"\x1bs\x1b\x01AB");
        let mut msr = device_with(mock, DataMode::Ascii);
        let err = msr.read().unwrap_err();
        match err {
            Error::Protocol(msg) => assert!(msg.contains("incomplete"), "got {msg}"),
            other => panic!("expected Protocol, got {other:?}"),
        }
    }

    #[test]
    fn write_ascii_frames_each_track() {
        let mut mock = MockTransport::new();
        mock.expect(b"\x1bw\x1bs", b"");
        mock.expect(b"\x1b\x01ABC", b"");
        mock.expect(b"\x1b\x02", b"");
        mock.expect(b"\x1b\x03XY", b"");
        mock.expect(b"?\x1c", b"\x1b0");
        let mut msr = device_with(mock, DataMode::Ascii);
        msr.write(&[
            Some(b"ABC".to_vec()),
            Some(Vec::new()),
            Some(b"XY".to_vec()),
        ])
        .unwrap();
    }

    #[test]
    fn write_skips_preserved_tracks() {
        let mut mock = MockTransport::new();
        mock.expect(b"\x1bw\x1bs", b"");
        mock.expect(b"\x1b\x02=99=", b"");
        mock.expect(b"?\x1c", b"\x1b0");
        let mut msr = device_with(mock, DataMode::Ascii);
        msr.write(&[None, Some(b"=99=".to_vec()), None]).unwrap();
    }

    #[test]
    fn write_raw_includes_length_bytes() {
        let mut mock = MockTransport::new();
        mock.expect(b"\x1bn\x1bs", b"");
        mock.expect(b"\x1b\x01\x03ABC", b"");
        mock.expect(b"?\x1c", b"\x1b0");
        let mut msr = device_with(mock, DataMode::Raw);
        msr.write(&[Some(b"ABC".to_vec()), None, None]).unwrap();
    }

    #[test]
    fn write_rejects_oversized_raw_track_before_io() {
        let mock = MockTransport::new();
        let mut msr = device_with(mock, DataMode::Raw);
        let err = msr
            .write(&[Some(vec![0u8; 256]), None, None])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
        // Nothing may have reached the transport.
    }

    #[test]
    fn write_surfaces_device_error_status() {
        let mut mock = MockTransport::new();
        mock.expect(b"\x1bw\x1bs", b"");
        mock.expect(b"\x1b\x01A", b"");
        mock.expect(b"?\x1c", b"\x1b1");
        let mut msr = device_with(mock, DataMode::Ascii);
        let err = msr.write(&[Some(b"A".to_vec()), None, None]).unwrap_err();
        assert!(matches!(err, Error::Device(DeviceErrorKind::ReadWrite)));
    }

    #[test]
    fn unknown_status_byte_named_in_hex() {
        let mut mock = MockTransport::new();
        mock.expect(b"\x1bc\x07", b"\x1b\x7e");
        let mut msr = device_with(mock, DataMode::Ascii);
        let err = msr.erase(TrackSelection::all()).unwrap_err();
        match err {
            Error::Protocol(msg) => assert!(msg.contains("0x7e"), "got {msg}"),
            other => panic!("expected Protocol, got {other:?}"),
        }
    }

    #[test]
    fn firmware_version_strips_escape() {
        let mut mock = MockTransport::new();
        mock.expect(b"\x1bv", b"\x1bREV3.12");
        let mut msr = device_with(mock, DataMode::Ascii);
        assert_eq!(msr.firmware_version().unwrap(), "REV3.12");
    }

    #[test]
    fn raw_command_returns_reply() {
        let mut mock = MockTransport::new();
        mock.expect(b"\x1bt", b"\x1bMSR605");
        let mut msr = device_with(mock, DataMode::Ascii);
        assert_eq!(msr.raw_command(b"t").unwrap(), b"\x1bMSR605");
    }

    #[test]
    fn data_mode_accessor() {
        let msr = device_with(MockTransport::new(), DataMode::Raw);
        assert_eq!(msr.data_mode(), DataMode::Raw);
    }
}
