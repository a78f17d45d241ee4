//! USB HID transport for the MSR605X.
//!
//! The MSR605X presents as a USB HID device (vendor 0x0801, product
//! 0x0003) and tunnels the MSR605 serial protocol through 64-byte packets
//! (see [`framing`](crate::framing)). Outgoing packets are delivered as
//! feature reports with report ID 0 -- the hidapi equivalent of the
//! SET_REPORT control transfer (wValue 0x0300) the vendor software uses --
//! and incoming packets arrive on the interrupt endpoint.
//!
//! [`HidTransport`] hides all of that behind the [`Transport`] trait:
//! `send` fragments a message into packets, `receive` reassembles incoming
//! packets into a message and hands it out in whatever chunk sizes the
//! caller asks for, buffering the remainder between calls.

use std::ffi::CString;
use std::time::Duration;

use hidapi::{HidApi, HidDevice};
use maglib_core::error::{Error, Result};
use maglib_core::transport::Transport;

use crate::framing::{self, Packet, Reassembler, PACKET_SIZE};

/// Default USB vendor ID of the MSR605X.
pub const MSR605X_VID: u16 = 0x0801;

/// Default USB product ID of the MSR605X.
pub const MSR605X_PID: u16 = 0x0003;

/// USB HID transport for MSR605X card reader/writers.
pub struct HidTransport {
    /// HID device handle.
    device: Option<HidDevice>,
    /// Reassembled message bytes not yet handed to the caller.
    buffer: Vec<u8>,
}

impl HidTransport {
    /// Open the first MSR605X found via its default vendor/product IDs.
    pub fn open() -> Result<Self> {
        let api = HidApi::new()
            .map_err(|e| Error::Transport(format!("Failed to initialize HID API: {e}")))?;
        Self::open_device(&api, MSR605X_VID, MSR605X_PID)
    }

    /// Open a HID device by vendor and product ID.
    pub fn open_device(api: &HidApi, vendor_id: u16, product_id: u16) -> Result<Self> {
        let device = api.open(vendor_id, product_id).map_err(|e| {
            Error::Transport(format!(
                "Failed to open HID device {vendor_id:04x}:{product_id:04x}: {e}"
            ))
        })?;

        tracing::info!(
            vendor_id = format_args!("{vendor_id:04x}"),
            product_id = format_args!("{product_id:04x}"),
            "HID device opened"
        );

        Ok(Self {
            device: Some(device),
            buffer: Vec::new(),
        })
    }

    /// Open a specific HID device path as reported by the platform.
    pub fn open_path(api: &HidApi, path: &str) -> Result<Self> {
        let c_path = CString::new(path)
            .map_err(|e| Error::Transport(format!("Invalid device path: {e}")))?;

        let device = api
            .open_path(&c_path)
            .map_err(|e| Error::Transport(format!("Failed to open HID device {path}: {e}")))?;

        tracing::info!(path = %path, "HID device opened");

        Ok(Self {
            device: Some(device),
            buffer: Vec::new(),
        })
    }

    /// Write one packet to the device.
    fn write_packet(&self, packet: &Packet) -> Result<()> {
        let device = self.device.as_ref().ok_or(Error::NotConnected)?;

        // hidapi wants the report ID in front; the MSR605X uses report 0.
        let mut report = [0u8; PACKET_SIZE + 1];
        report[1..].copy_from_slice(packet.as_bytes());

        device
            .send_feature_report(&report)
            .map_err(|e| Error::Transport(format!("Failed to write packet: {e}")))
    }

    /// Read one packet from the interrupt endpoint.
    ///
    /// Returns `Ok(None)` when the timeout expires with no packet.
    fn read_packet(&self, timeout: Duration) -> Result<Option<Packet>> {
        let device = self.device.as_ref().ok_or(Error::NotConnected)?;

        let mut buf = [0u8; PACKET_SIZE];
        let n = device
            .read_timeout(&mut buf, timeout.as_millis() as i32)
            .map_err(|e| Error::Transport(format!("Failed to read packet: {e}")))?;

        if n == 0 {
            return Ok(None);
        }
        if n != PACKET_SIZE {
            return Err(Error::Transport(format!(
                "Short HID read: {n} of {PACKET_SIZE} bytes"
            )));
        }
        Ok(Some(Packet::from_bytes(buf)))
    }

    /// Receive one whole message, reassembling packets until the
    /// end-of-sequence bit.
    ///
    /// A timeout before the first packet means nothing was received and
    /// yields [`Error::Timeout`]. A timeout mid-message returns the bytes
    /// collected so far: incomplete data propagates up, where the command
    /// protocol reports a malformed response instead of silently
    /// truncating.
    fn receive_message(&self, timeout: Duration) -> Result<Vec<u8>> {
        let mut assembler = Reassembler::new();
        let mut got_packet = false;
        loop {
            match self.read_packet(timeout)? {
                Some(packet) => {
                    got_packet = true;
                    if assembler.push(&packet) {
                        tracing::trace!(bytes = assembler.len(), "message received");
                        return Ok(assembler.into_message());
                    }
                }
                None if !got_packet => return Err(Error::Timeout),
                None => {
                    tracing::warn!(
                        bytes = assembler.len(),
                        "message truncated by timeout before end of sequence"
                    );
                    return Ok(assembler.into_message());
                }
            }
        }
    }
}

impl Transport for HidTransport {
    fn send(&mut self, data: &[u8]) -> Result<()> {
        if self.device.is_none() {
            return Err(Error::NotConnected);
        }

        tracing::trace!(bytes = data.len(), data = ?data, "sending message");
        for packet in framing::fragment(data) {
            self.write_packet(&packet)?;
        }
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        if self.device.is_none() {
            return Err(Error::NotConnected);
        }

        if self.buffer.is_empty() {
            self.buffer = self.receive_message(timeout)?;
        }

        let n = buf.len().min(self.buffer.len());
        buf[..n].copy_from_slice(&self.buffer[..n]);
        self.buffer.drain(..n);
        Ok(n)
    }

    fn close(&mut self) -> Result<()> {
        if self.device.take().is_some() {
            tracing::debug!("closing HID device");
        }
        self.buffer.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.device.is_some()
    }
}
