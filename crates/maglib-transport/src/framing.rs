//! MSR605X HID packet framing.
//!
//! The MSR605X wraps the MSR605 serial protocol in fixed 64-byte USB HID
//! packets. Byte 0 is a header: bit 7 marks the first packet of a message,
//! bit 6 the last, and bits 5..0 carry the payload length (0..=63). Bytes
//! `1..=len` are payload; the rest of the packet is padding whose content
//! is meaningless and must never be interpreted (the vendor software fills
//! it with whatever was left in memory).
//!
//! # Encapsulation example
//!
//! The message `"string"` fits a single packet whose header is `0xC6`:
//! start of sequence, end of sequence, payload length 6.
//!
//! This module is the pure half of the HID transport: [`fragment`] splits
//! a message into packets and [`Reassembler`] folds received packets back
//! into one. [`HidTransport`](crate::hid::HidTransport) moves the packets.

/// Fixed HID packet size.
pub const PACKET_SIZE: usize = 64;

/// Largest payload one packet can carry (one byte goes to the header).
pub const MAX_PAYLOAD: usize = PACKET_SIZE - 1;

const START_BIT: u8 = 0b1000_0000;
const END_BIT: u8 = 0b0100_0000;
const LENGTH_MASK: u8 = 0b0011_1111;

/// A single 64-byte HID packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet {
    data: [u8; PACKET_SIZE],
}

impl Packet {
    /// Build a packet from a payload and its position in the sequence.
    ///
    /// # Panics
    ///
    /// Panics if `payload` exceeds [`MAX_PAYLOAD`] bytes; [`fragment`]
    /// never produces such a chunk.
    pub fn new(start: bool, end: bool, payload: &[u8]) -> Self {
        assert!(payload.len() <= MAX_PAYLOAD, "payload exceeds packet capacity");
        let mut data = [0u8; PACKET_SIZE];
        let mut header = payload.len() as u8 & LENGTH_MASK;
        if start {
            header |= START_BIT;
        }
        if end {
            header |= END_BIT;
        }
        data[0] = header;
        data[1..1 + payload.len()].copy_from_slice(payload);
        Packet { data }
    }

    /// Wrap a raw 64-byte buffer received from the device.
    pub fn from_bytes(data: [u8; PACKET_SIZE]) -> Self {
        Packet { data }
    }

    /// The raw packet bytes, ready for transmission.
    pub fn as_bytes(&self) -> &[u8; PACKET_SIZE] {
        &self.data
    }

    /// Whether this packet starts a message sequence (header bit 7).
    pub fn is_start(&self) -> bool {
        self.data[0] & START_BIT != 0
    }

    /// Whether this packet ends a message sequence (header bit 6).
    pub fn is_end(&self) -> bool {
        self.data[0] & END_BIT != 0
    }

    /// The payload length recorded in the header (bits 5..0).
    pub fn payload_len(&self) -> usize {
        (self.data[0] & LENGTH_MASK) as usize
    }

    /// Exactly the payload bytes; padding is never exposed.
    pub fn payload(&self) -> &[u8] {
        &self.data[1..1 + self.payload_len()]
    }
}

/// Fragment a message into the packets that carry it.
///
/// Produces `ceil(len / 63)` packets, minimum one: an empty message still
/// yields a single packet with both sequence bits set and a zero length.
/// The start bit is set only on the first packet and the end bit only on
/// the last (the same packet when only one is produced).
pub fn fragment(message: &[u8]) -> Vec<Packet> {
    if message.is_empty() {
        return vec![Packet::new(true, true, &[])];
    }
    let count = message.len().div_ceil(MAX_PAYLOAD);
    let mut packets = Vec::with_capacity(count);
    for (i, chunk) in message.chunks(MAX_PAYLOAD).enumerate() {
        packets.push(Packet::new(i == 0, i == count - 1, chunk));
    }
    packets
}

/// Receive-side reassembly of packets into one message.
///
/// Feed packets in arrival order with [`push`](Reassembler::push); the
/// message is complete once a packet with the end-of-sequence bit has been
/// consumed. Each packet contributes exactly the payload bytes its header
/// declares.
#[derive(Debug, Default)]
pub struct Reassembler {
    message: Vec<u8>,
}

impl Reassembler {
    pub fn new() -> Self {
        Reassembler::default()
    }

    /// Append one packet's payload. Returns `true` when this packet ends
    /// the sequence.
    pub fn push(&mut self, packet: &Packet) -> bool {
        self.message.extend_from_slice(packet.payload());
        packet.is_end()
    }

    /// Number of message bytes collected so far.
    pub fn len(&self) -> usize {
        self.message.len()
    }

    /// Whether no bytes have been collected yet.
    pub fn is_empty(&self) -> bool {
        self.message.is_empty()
    }

    /// The reassembled message.
    pub fn into_message(self) -> Vec<u8> {
        self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reassemble(packets: &[Packet]) -> Vec<u8> {
        let mut assembler = Reassembler::new();
        for packet in packets {
            if assembler.push(packet) {
                break;
            }
        }
        assembler.into_message()
    }

    // ---------------------------------------------------------------
    // Header bit extraction
    // ---------------------------------------------------------------

    fn packet_with_header(header: u8) -> Packet {
        let mut data = [0u8; PACKET_SIZE];
        data[0] = header;
        Packet::from_bytes(data)
    }

    #[test]
    fn header_0xc6_start_end_len6() {
        let p = packet_with_header(0xC6);
        assert!(p.is_start());
        assert!(p.is_end());
        assert_eq!(p.payload_len(), 6);
    }

    #[test]
    fn header_0xbf_start_len63() {
        let p = packet_with_header(0xBF);
        assert!(p.is_start());
        assert!(!p.is_end());
        assert_eq!(p.payload_len(), 63);
    }

    #[test]
    fn header_0x3f_len63_only() {
        let p = packet_with_header(0x3F);
        assert!(!p.is_start());
        assert!(!p.is_end());
        assert_eq!(p.payload_len(), 63);
    }

    // ---------------------------------------------------------------
    // Fragmentation
    // ---------------------------------------------------------------

    #[test]
    fn single_packet_message() {
        // "string" -> one packet, header 0xC6 (the vendor protocol's own
        // documentation example).
        let packets = fragment(b"string");
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].as_bytes()[0], 0xC6);
        assert_eq!(packets[0].payload(), b"string");
    }

    #[test]
    fn empty_message_still_produces_one_packet() {
        let packets = fragment(&[]);
        assert_eq!(packets.len(), 1);
        assert!(packets[0].is_start());
        assert!(packets[0].is_end());
        assert_eq!(packets[0].payload_len(), 0);
    }

    #[test]
    fn three_packet_message_headers() {
        // 63 + 63 + 15 bytes, as in the vendor protocol documentation:
        // headers 0xBF, 0x3F, 0x4F.
        let message = vec![b'A'; 141];
        let packets = fragment(&message);
        assert_eq!(packets.len(), 3);
        assert_eq!(packets[0].as_bytes()[0], 0xBF);
        assert_eq!(packets[1].as_bytes()[0], 0x3F);
        assert_eq!(packets[2].as_bytes()[0], 0x4F);
    }

    #[test]
    fn fragment_round_trip_at_boundary_lengths() {
        for len in [0usize, 1, 63, 64, 126, 189] {
            let message: Vec<u8> = (0..len).map(|i| (i * 7 + 3) as u8).collect();
            let packets = fragment(&message);

            assert_eq!(packets.len(), len.div_ceil(MAX_PAYLOAD).max(1), "len {len}");
            assert!(packets.iter().all(|p| p.as_bytes().len() == PACKET_SIZE));
            assert_eq!(
                packets.iter().filter(|p| p.is_start()).count(),
                1,
                "exactly one start packet for len {len}"
            );
            assert_eq!(
                packets.iter().filter(|p| p.is_end()).count(),
                1,
                "exactly one end packet for len {len}"
            );
            assert!(packets[0].is_start());
            assert!(packets.last().unwrap().is_end());

            assert_eq!(reassemble(&packets), message, "round trip for len {len}");
        }
    }

    #[test]
    fn reassembly_ignores_padding() {
        // Padding bytes after the declared payload length carry no
        // meaning; make sure they never leak into the message.
        let mut data = [0xEE; PACKET_SIZE];
        data[0] = 0xC3; // start, end, length 3
        data[1..4].copy_from_slice(b"abc");
        let packet = Packet::from_bytes(data);
        assert_eq!(reassemble(&[packet]), b"abc");
    }

    #[test]
    fn reassembler_tracks_progress() {
        let packets = fragment(&[0x55; 100]);
        let mut assembler = Reassembler::new();
        assert!(assembler.is_empty());
        assert!(!assembler.push(&packets[0]));
        assert_eq!(assembler.len(), 63);
        assert!(assembler.push(&packets[1]));
        assert_eq!(assembler.into_message(), vec![0x55; 100]);
    }
}
