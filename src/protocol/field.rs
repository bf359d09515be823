//! Monitoring field definition telegram (`sRA field<N>`).
//!
//! Layout after the command text (offsets from the first STX byte):
//!
//! | Offset | Width | Type | Field |
//! |---|---|---|---|
//! | 21 | 4 | FLOAT32 | distance scale factor |
//! | 25 | 4 | FLOAT32 | distance scale offset |
//! | 29 | 4 | UINT32 | angle scale factor |
//! | 33 | 4 | INT32 | angle scale offset |
//! | 37 | 1 | UINT8 | field type |
//! | 38 | 1 | UINT8 | field number |
//! | 39 | 2 | UINT16 | segmented field configured |
//! | 41 | 2 | UINT16 | point count (segmented only) |
//! | 43 + 6i | 6 | 3 x UINT16 | angle index, start distance, stop distance |

use std::f64::consts::PI;

use crate::codec;
use crate::error::{ProtocolError, Result};
use crate::frame::{HEADER_LEN, RawFrame};
use crate::monitor::{FIELD_CAPACITY, PolarPoint};
use crate::protocol::{METHOD_READ_ANSWER, NAME_FIELD_PREFIX, command_text};

/// Bytes up to and including `segmented_field_configured`.
pub const FIELD_HEADER_LEN: usize = 41;

const POINT_COUNT_OFFSET: usize = 41;
const POINTS_OFFSET: usize = 43;

/// Bytes per segment: angle index, start distance, stop distance.
pub const FIELD_POINT_STRIDE: usize = 6;

/// Scaling and identification block of a field definition.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FieldHeader {
    /// Raw distance unit to millimetres
    pub dist_scale_factor: f32,
    /// Added to scaled distance (mm)
    pub dist_scale_offset: f32,
    /// Angle index to 1/10000 deg
    pub ang_scale_factor: u32,
    /// Added to scaled angle (1/10000 deg)
    pub ang_scale_offset: i32,
    pub field_type: u8,
    /// Field number as reported in the binary block
    pub field_number: u8,
    /// 1 = segmented field (point list follows); other representations are not decoded
    pub segmented_field_configured: u16,
}

impl FieldHeader {
    /// Header of a segmented field with the given scaling.
    pub fn segmented(
        dist_scale_factor: f32,
        dist_scale_offset: f32,
        ang_scale_factor: u32,
        ang_scale_offset: i32,
    ) -> Self {
        Self {
            dist_scale_factor,
            dist_scale_offset,
            ang_scale_factor,
            ang_scale_offset,
            field_type: 0,
            field_number: 0,
            segmented_field_configured: 1,
        }
    }

    pub fn is_segmented(&self) -> bool {
        self.segmented_field_configured == 1
    }

    /// Convert a raw segment to a polar boundary point.
    ///
    /// Only the stop distance is used: the far edge of each angular segment
    /// is the field boundary.
    pub fn polar_point(&self, segment: &FieldSegment) -> PolarPoint {
        let angle_deg = f64::from(segment.angle_index) * f64::from(self.ang_scale_factor) / 1e4
            + f64::from(self.ang_scale_offset) / 1e4;
        let distance_mm = f64::from(segment.stop_dist) * f64::from(self.dist_scale_factor)
            + f64::from(self.dist_scale_offset);
        PolarPoint {
            distance_m: distance_mm / 1000.0,
            angle_rad: angle_deg * (PI / 180.0),
        }
    }
}

/// One raw segment of a segmented field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSegment {
    pub angle_index: u16,
    pub start_dist: u16,
    pub stop_dist: u16,
}

/// A decoded field definition. `field_index` is taken from the command text
/// and is always below [`FIELD_CAPACITY`] after `decode`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub field_index: usize,
    pub header: FieldHeader,
    /// Empty unless the header marks the field as segmented
    pub segments: Vec<FieldSegment>,
}

impl FieldDefinition {
    pub fn decode(datagram: &[u8]) -> Result<Self> {
        Self::decode_inner(datagram).map_err(|e| e.with_raw(datagram))
    }

    /// ASCII (CoLa-A) variant. Not supported.
    pub fn decode_ascii(_datagram: &[u8]) -> Result<Self> {
        Err(ProtocolError::NotImplemented {
            what: "ASCII field definition",
        })
    }

    fn decode_inner(d: &[u8]) -> Result<Self> {
        let field_index = parse_field_command(d)?;

        codec::check_len(d, 0, FIELD_HEADER_LEN, "FieldDefinition")?;
        let header = FieldHeader {
            dist_scale_factor: codec::read_float32(d, 21)?,
            dist_scale_offset: codec::read_float32(d, 25)?,
            ang_scale_factor: codec::read_uint32(d, 29)?,
            ang_scale_offset: codec::read_int32(d, 33)?,
            field_type: codec::read_uint8(d, 37)?,
            field_number: codec::read_uint8(d, 38)?,
            segmented_field_configured: codec::read_uint16(d, 39)?,
        };

        let mut segments = Vec::new();
        if header.is_segmented() {
            let count = usize::from(codec::read_uint16(d, POINT_COUNT_OFFSET)?);
            codec::check_len(d, POINTS_OFFSET, count * FIELD_POINT_STRIDE, "FieldDefinition")?;
            segments.reserve_exact(count);
            for point in 0..count {
                let base = POINTS_OFFSET + point * FIELD_POINT_STRIDE;
                segments.push(FieldSegment {
                    angle_index: codec::read_uint16(d, base)?,
                    start_dist: codec::read_uint16(d, base + 2)?,
                    stop_dist: codec::read_uint16(d, base + 4)?,
                });
            }
        }

        Ok(Self {
            field_index,
            header,
            segments,
        })
    }

    /// Boundary points in transmitted (angular scan) order.
    pub fn polar_points(&self) -> Vec<PolarPoint> {
        self.segments
            .iter()
            .map(|s| self.header.polar_point(s))
            .collect()
    }

    /// Encode as a complete binary telegram.
    ///
    /// At most `u16::MAX` segments are written.
    pub fn encode(&self) -> Vec<u8> {
        let command = format!("{METHOD_READ_ANSWER} {NAME_FIELD_PREFIX}{:03} ", self.field_index);
        let mut payload = command.into_bytes();
        codec::write_float32(&mut payload, self.header.dist_scale_factor);
        codec::write_float32(&mut payload, self.header.dist_scale_offset);
        codec::write_uint32(&mut payload, self.header.ang_scale_factor);
        codec::write_int32(&mut payload, self.header.ang_scale_offset);
        payload.push(self.header.field_type);
        payload.push(self.header.field_number);
        codec::write_uint16(&mut payload, self.header.segmented_field_configured);
        if self.header.is_segmented() {
            let count = self.segments.len().min(usize::from(u16::MAX));
            codec::write_uint16(&mut payload, count as u16);
            for s in &self.segments[..count] {
                codec::write_uint16(&mut payload, s.angle_index);
                codec::write_uint16(&mut payload, s.start_dist);
                codec::write_uint16(&mut payload, s.stop_dist);
            }
        }
        RawFrame::new(&payload).into_bytes()
    }
}

// ---------------------------------------------------------------------------
// Command parsing
// ---------------------------------------------------------------------------

/// Extract `<N>` from a command of the form `sRA field<N>` and check it
/// against the field table.
///
/// Whitespace between `sRA` and `field` is optional and may repeat, as is
/// whitespace before the number; the number may carry a sign.
pub fn parse_field_command(datagram: &[u8]) -> Result<usize> {
    let malformed = || ProtocolError::MalformedCommand {
        command: command_text(datagram),
    };
    let text = datagram.get(HEADER_LEN..).ok_or_else(malformed)?;

    let rest = text
        .strip_prefix(METHOD_READ_ANSWER.as_bytes())
        .ok_or_else(malformed)?;
    let rest = rest.trim_ascii_start();
    let rest = rest
        .strip_prefix(NAME_FIELD_PREFIX.as_bytes())
        .ok_or_else(malformed)?;
    let rest = rest.trim_ascii_start();

    let (negative, digits) = match rest.first() {
        Some(b'-') => (true, &rest[1..]),
        Some(b'+') => (false, &rest[1..]),
        _ => (false, rest),
    };
    let len = digits.iter().take_while(|b| b.is_ascii_digit()).count();
    if len == 0 {
        return Err(malformed());
    }

    let magnitude = digits[..len].iter().fold(0i64, |acc, &b| {
        acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
    });
    let index = if negative { -magnitude } else { magnitude };

    match usize::try_from(index) {
        Ok(i) if i < FIELD_CAPACITY => Ok(i),
        _ => Err(ProtocolError::FieldIndexOutOfRange { index }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
