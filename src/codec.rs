//! Field codecs for binary (CoLa-B) telegrams.
//!
//! All multi-byte values are big-endian on the wire. Offsets are absolute
//! from the first byte of the telegram, i.e. including the 8-byte STX and
//! length header.

use crate::error::{ProtocolError, Result};

// ---------------------------------------------------------------------------
// Read helpers
// ---------------------------------------------------------------------------

/// Read an unsigned 8-bit integer.
pub fn read_uint8(data: &[u8], offset: usize) -> Result<u8> {
    check_len(data, offset, 1, "UINT8")?;
    Ok(data[offset])
}

/// Read a big-endian unsigned 16-bit integer.
pub fn read_uint16(data: &[u8], offset: usize) -> Result<u16> {
    check_len(data, offset, 2, "UINT16")?;
    Ok(u16::from_be_bytes([data[offset], data[offset + 1]]))
}

/// Read a big-endian signed 32-bit integer.
pub fn read_int32(data: &[u8], offset: usize) -> Result<i32> {
    Ok(i32::from_be_bytes(read_array4(data, offset, "INT32")?))
}

/// Read a big-endian unsigned 32-bit integer.
pub fn read_uint32(data: &[u8], offset: usize) -> Result<u32> {
    Ok(u32::from_be_bytes(read_array4(data, offset, "UINT32")?))
}

/// Read a big-endian IEEE 754 single-precision float.
pub fn read_float32(data: &[u8], offset: usize) -> Result<f32> {
    Ok(f32::from_be_bytes(read_array4(data, offset, "FLOAT32")?))
}

// ---------------------------------------------------------------------------
// Write helpers
// ---------------------------------------------------------------------------

/// Write a big-endian unsigned 16-bit integer.
pub fn write_uint16(buf: &mut Vec<u8>, val: u16) {
    buf.extend_from_slice(&val.to_be_bytes());
}

/// Write a big-endian signed 32-bit integer.
pub fn write_int32(buf: &mut Vec<u8>, val: i32) {
    buf.extend_from_slice(&val.to_be_bytes());
}

/// Write a big-endian unsigned 32-bit integer.
pub fn write_uint32(buf: &mut Vec<u8>, val: u32) {
    buf.extend_from_slice(&val.to_be_bytes());
}

/// Write a big-endian IEEE 754 single-precision float.
pub fn write_float32(buf: &mut Vec<u8>, val: f32) {
    buf.extend_from_slice(&val.to_be_bytes());
}

// ---------------------------------------------------------------------------
// Internal
// ---------------------------------------------------------------------------

fn read_array4(data: &[u8], offset: usize, name: &'static str) -> Result<[u8; 4]> {
    check_len(data, offset, 4, name)?;
    Ok([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

pub(crate) fn check_len(data: &[u8], offset: usize, need: usize, name: &'static str) -> Result<()> {
    match offset.checked_add(need) {
        Some(end) if end <= data.len() => Ok(()),
        _ => Err(ProtocolError::truncated(
            name,
            offset.saturating_add(need),
            data.len(),
        )),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
