//! Telegram framing, checksum, and stream splitting.
//!
//! Binary (CoLa-B) wire format:
//! ```text
//! 02 02 02 02 LEN_3 LEN_2 LEN_1 LEN_0 PAYLOAD[LEN] XOR
//! ```
//! `XOR` is the exclusive-or of every payload byte. Message decoders address
//! offsets from the first STX byte, so a [`RawFrame`] keeps the telegram whole.
//!
//! ASCII (CoLa-A) telegrams are `02 <text> 03`. They are split out of the
//! stream so they can be rejected explicitly, never decoded.

use crate::error::{ProtocolError, Result};

const STX: u8 = 0x02;
const ETX: u8 = 0x03;
const BINARY_START: [u8; 4] = [STX; 4];

/// Bytes before the payload: four STX plus the 32-bit length.
pub const HEADER_LEN: usize = 8;

/// Default upper bound on a declared payload length.
pub const DEFAULT_MAX_FRAME_LEN: usize = 65_536;

/// A validated binary telegram, header and checksum included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    datagram: Vec<u8>,
}

impl RawFrame {
    /// Wrap a payload (command text plus data) into a complete telegram.
    pub fn new(payload: &[u8]) -> Self {
        let mut datagram = Vec::with_capacity(HEADER_LEN + payload.len() + 1);
        datagram.extend_from_slice(&BINARY_START);
        // Payloads are bounded by the 16-bit point count long before u32.
        datagram.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        datagram.extend_from_slice(payload);
        datagram.push(checksum(payload));
        Self { datagram }
    }

    /// Parse a single complete binary telegram.
    pub fn parse(wire: &[u8]) -> Result<Self> {
        if wire.len() < HEADER_LEN + 1 {
            return Err(ProtocolError::FrameTooShort { len: wire.len() });
        }
        if wire[..4] != BINARY_START {
            return Err(ProtocolError::MissingStart);
        }

        let declared = u32::from_be_bytes([wire[4], wire[5], wire[6], wire[7]]) as usize;
        let got = wire.len() - HEADER_LEN - 1;
        if declared != got {
            return Err(ProtocolError::LengthMismatch { declared, got });
        }

        let payload = &wire[HEADER_LEN..wire.len() - 1];
        let expected = wire[wire.len() - 1];
        let computed = checksum(payload);
        if expected != computed {
            return Err(ProtocolError::ChecksumMismatch { expected, computed });
        }

        Ok(Self {
            datagram: wire.to_vec(),
        })
    }

    /// The whole telegram, as handed to the message decoders.
    pub fn as_bytes(&self) -> &[u8] {
        &self.datagram
    }

    /// Command text plus data, without header and checksum.
    pub fn payload(&self) -> &[u8] {
        &self.datagram[HEADER_LEN..self.datagram.len() - 1]
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.datagram
    }
}

/// True if `wire` looks like an ASCII (CoLa-A) telegram.
pub fn is_ascii_telegram(wire: &[u8]) -> bool {
    wire.len() >= 2 && wire[0] == STX && wire[1].is_ascii_alphabetic()
}

fn checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0, |acc, &b| acc ^ b)
}

/// Splits a byte stream into individual telegrams. Buffers partial data
/// across calls, so it can be fed arbitrary transport chunk boundaries.
pub struct FrameSplitter {
    buf: Vec<u8>,
    max_frame_len: usize,
}

impl FrameSplitter {
    pub fn new() -> Self {
        Self::with_max_frame_len(DEFAULT_MAX_FRAME_LEN)
    }

    /// Declared payload lengths above `max_frame_len` are treated as a false
    /// start and skipped.
    pub fn with_max_frame_len(max_frame_len: usize) -> Self {
        Self {
            buf: Vec::with_capacity(512),
            max_frame_len,
        }
    }

    /// Feed new data and extract any complete telegrams.
    ///
    /// Binary telegrams are returned header to checksum, ASCII telegrams STX
    /// to ETX. Partial telegrams are buffered for the next call.
    pub fn feed(&mut self, data: &[u8]) -> Vec<Vec<u8>> {
        self.buf.extend_from_slice(data);
        let mut frames = Vec::new();

        loop {
            let start = match self.buf.iter().position(|&b| b == STX) {
                Some(pos) => pos,
                None => {
                    self.buf.clear();
                    break;
                }
            };
            if start > 0 {
                self.buf.drain(..start);
            }
            if self.buf.len() < 2 {
                break;
            }

            if self.buf[1].is_ascii_alphabetic() {
                // ASCII telegram: STX printable text ETX. Any other control
                // byte before the ETX means this STX was not a telegram start.
                let text_end = self.buf[1..]
                    .iter()
                    .position(|b| !(0x20..=0x7E).contains(b))
                    .map(|i| i + 1);
                match text_end {
                    Some(end) if self.buf[end] == ETX => {
                        frames.push(self.buf.drain(..=end).collect());
                        continue;
                    }
                    Some(_) => {
                        self.buf.drain(..1);
                        continue;
                    }
                    None if self.buf.len() > self.max_frame_len => {
                        self.buf.drain(..1);
                        continue;
                    }
                    None => break,
                }
            }

            if self.buf[1] != STX {
                self.buf.drain(..1);
                continue;
            }
            if self.buf.len() < HEADER_LEN {
                break;
            }
            if self.buf[..4] != BINARY_START {
                self.buf.drain(..1);
                continue;
            }

            let declared =
                u32::from_be_bytes([self.buf[4], self.buf[5], self.buf[6], self.buf[7]]) as usize;
            if declared > self.max_frame_len {
                log::debug!("skipping false start: declared length {declared} exceeds limit");
                self.buf.drain(..1);
                continue;
            }

            let total = HEADER_LEN + declared + 1;
            if self.buf.len() < total {
                break;
            }
            frames.push(self.buf.drain(..total).collect());
        }

        frames
    }

    /// Drop any buffered partial telegram.
    pub fn reset(&mut self) {
        self.buf.clear();
    }
}

impl Default for FrameSplitter {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
