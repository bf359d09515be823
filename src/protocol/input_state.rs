//! Active field set telegram (`LIDinputstate`).

use crate::error::{ProtocolError, Result};
use crate::frame::{HEADER_LEN, RawFrame};
use crate::protocol::{METHOD_EVENT, NAME_INPUT_STATE};

/// Offset of the first input byte (INT1). INT1..INT4 occupy 32..=35.
const INPUT_OFFSET: usize = 32;

/// Shortest binary telegram carrying all four inputs.
pub const INPUT_STATE_MIN_LEN: usize = 37;

/// Field set selection inputs reported by the scanner.
///
/// Four digital inputs select the active field set. Each input byte counts
/// as set when non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LidInputState {
    /// INT1..INT4 in wire order (bytes 32..=35)
    pub inputs: [bool; 4],
}

impl LidInputState {
    pub fn decode(datagram: &[u8]) -> Result<Self> {
        if datagram.len() < INPUT_STATE_MIN_LEN {
            return Err(ProtocolError::truncated(
                "LIDinputstate",
                INPUT_STATE_MIN_LEN,
                datagram.len(),
            )
            .with_raw(datagram));
        }
        let mut inputs = [false; 4];
        for (i, input) in inputs.iter_mut().enumerate() {
            *input = datagram[INPUT_OFFSET + i] != 0;
        }
        Ok(Self { inputs })
    }

    /// ASCII (CoLa-A) variant. Not supported.
    pub fn decode_ascii(_datagram: &[u8]) -> Result<Self> {
        Err(ProtocolError::NotImplemented {
            what: "ASCII LIDinputstate",
        })
    }

    /// Build the inputs that select `field_set` (low 4 bits).
    pub fn from_field_set(field_set: u8) -> Self {
        let mut inputs = [false; 4];
        for (i, input) in inputs.iter_mut().enumerate() {
            // INT1 is bit 3, INT4 is bit 0
            *input = field_set & (0x08 >> i) != 0;
        }
        Self { inputs }
    }

    /// Active field set index, 0-15.
    ///
    /// INT4 (byte 35) is bit 0 and INT1 (byte 32) is bit 3.
    pub fn active_field_set(&self) -> u8 {
        self.inputs
            .iter()
            .fold(0, |acc, &set| (acc << 1) | u8::from(set))
    }

    /// Encode as a complete binary telegram.
    pub fn encode(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(INPUT_STATE_MIN_LEN);
        payload.extend_from_slice(format!("{METHOD_EVENT} {NAME_INPUT_STATE} ").as_bytes());
        // Version (u16) and system counter (u32), not interpreted here.
        payload.resize(INPUT_OFFSET - HEADER_LEN, 0);
        payload.extend(self.inputs.iter().map(|&set| u8::from(set)));
        RawFrame::new(&payload).into_bytes()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
