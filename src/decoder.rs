//! Entry points for callers that route telegrams by type themselves.
//!
//! Each decoder borrows the connection's [`FieldMonitorState`] and writes into
//! it only after the whole telegram has decoded. On error the state is
//! unchanged.

use crate::error::Result;
use crate::monitor::FieldMonitorState;
use crate::protocol::field::FieldDefinition;
use crate::protocol::input_state::LidInputState;

/// Decodes `LIDinputstate` telegrams into the active field set.
pub struct FieldSetStateDecoder<'a> {
    state: &'a mut FieldMonitorState,
}

impl<'a> FieldSetStateDecoder<'a> {
    pub fn new(state: &'a mut FieldMonitorState) -> Self {
        Self { state }
    }

    /// Decode a binary telegram (longer than 36 bytes) and overwrite the
    /// active field set.
    pub fn decode(&mut self, buffer: &[u8]) -> Result<()> {
        let msg = LidInputState::decode(buffer)?;
        self.state.set_active_field_set(msg.active_field_set());
        Ok(())
    }

    /// Always fails with `NotImplemented`.
    pub fn decode_ascii(&mut self, buffer: &[u8]) -> Result<()> {
        LidInputState::decode_ascii(buffer).map(drop)
    }
}

/// Decodes `sRA field<N>` telegrams and appends the boundary points to
/// field `N`.
pub struct FieldGeometryDecoder<'a> {
    state: &'a mut FieldMonitorState,
}

impl<'a> FieldGeometryDecoder<'a> {
    pub fn new(state: &'a mut FieldMonitorState) -> Self {
        Self { state }
    }

    /// Decode a binary field definition and append its points.
    ///
    /// Returns the number of points appended; zero for fields that are not
    /// segmented.
    pub fn decode(&mut self, buffer: &[u8]) -> Result<usize> {
        let def = FieldDefinition::decode(buffer)?;
        self.state.append_definition(&def)
    }

    /// Always fails with `NotImplemented`.
    pub fn decode_ascii(&mut self, buffer: &[u8]) -> Result<usize> {
        FieldDefinition::decode_ascii(buffer).map(|_| 0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;
    use crate::error::ProtocolError;
    use crate::frame::RawFrame;
    use crate::monitor::FIELD_CAPACITY;
    use crate::protocol::field::{FieldHeader, FieldSegment};

    fn input_state_telegram(bytes: [u8; 4]) -> Vec<u8> {
        let mut wire = LidInputState::from_field_set(0).encode();
        wire[32..36].copy_from_slice(&bytes);
        wire
    }

    fn two_point_field(index: usize) -> Vec<u8> {
        FieldDefinition {
            field_index: index,
            header: FieldHeader::segmented(1.0, 0.0, 100, 0),
            segments: vec![
                FieldSegment {
                    angle_index: 0,
                    start_dist: 500,
                    stop_dist: 1000,
                },
                FieldSegment {
                    angle_index: 9000,
                    start_dist: 500,
                    stop_dist: 2000,
                },
            ],
        }
        .encode()
    }

    #[test]
    fn field_set_from_inputs() {
        let mut state = FieldMonitorState::new();
        let mut decoder = FieldSetStateDecoder::new(&mut state);
        decoder.decode(&input_state_telegram([0, 0, 0, 1])).unwrap();
        decoder.decode(&input_state_telegram([0, 0, 0, 7])).unwrap();
        assert_eq!(state.active_field_set(), 1);

        FieldSetStateDecoder::new(&mut state)
            .decode(&input_state_telegram([1, 0, 0, 0]))
            .unwrap();
        assert_eq!(state.active_field_set(), 8);
    }

    #[test]
    fn field_set_overwrites_unconditionally() {
        let mut state = FieldMonitorState::new();
        let mut decoder = FieldSetStateDecoder::new(&mut state);
        decoder.decode(&input_state_telegram([1, 1, 1, 1])).unwrap();
        decoder.decode(&input_state_telegram([0, 0, 0, 0])).unwrap();
        assert_eq!(state.active_field_set(), 0);
    }

    #[test]
    fn short_input_state_leaves_state_unchanged() {
        let mut state = FieldMonitorState::new();
        FieldSetStateDecoder::new(&mut state)
            .decode(&input_state_telegram([0, 1, 0, 1]))
            .unwrap();

        let wire = input_state_telegram([1, 1, 1, 1]);
        let result = FieldSetStateDecoder::new(&mut state).decode(&wire[..36]);
        assert!(matches!(result, Err(ProtocolError::TruncatedMessage { .. })));
        assert_eq!(state.active_field_set(), 5);
    }

    #[test]
    fn ascii_variants_not_implemented() {
        let mut state = FieldMonitorState::new();
        assert!(matches!(
            FieldSetStateDecoder::new(&mut state).decode_ascii(b"\x02sSN LIDinputstate 1\x03"),
            Err(ProtocolError::NotImplemented { .. })
        ));
        assert!(matches!(
            FieldGeometryDecoder::new(&mut state).decode_ascii(b"\x02sRA field001\x03"),
            Err(ProtocolError::NotImplemented { .. })
        ));
        assert_eq!(state, FieldMonitorState::new());
    }

    #[test]
    fn geometry_two_points() {
        let mut state = FieldMonitorState::new();
        let added = FieldGeometryDecoder::new(&mut state)
            .decode(&two_point_field(6))
            .unwrap();
        assert_eq!(added, 2);

        let points = state.field(6).unwrap().points();
        assert_eq!(points.len(), 2);
        assert!((points[0].distance_m - 1.0).abs() < 1e-9);
        assert!((points[1].distance_m - 2.0).abs() < 1e-9);
        assert!(points[0].angle_rad.abs() < 1e-9);
        assert!((points[1].angle_rad - PI / 2.0).abs() < 1e-9);
    }

    #[test]
    fn geometry_same_telegram_twice_appends_twice() {
        let mut state = FieldMonitorState::new();
        let wire = two_point_field(2);
        let mut decoder = FieldGeometryDecoder::new(&mut state);
        decoder.decode(&wire).unwrap();
        decoder.decode(&wire).unwrap();
        assert_eq!(state.field(2).unwrap().len(), 4);

        state.begin_field_definition(2).unwrap();
        FieldGeometryDecoder::new(&mut state).decode(&wire).unwrap();
        assert_eq!(state.field(2).unwrap().len(), 2);
    }

    #[test]
    fn geometry_non_segmented_is_a_no_op() {
        let mut state = FieldMonitorState::new();
        let def = FieldDefinition {
            field_index: 10,
            header: FieldHeader {
                segmented_field_configured: 2,
                ..FieldHeader::segmented(1.0, 0.0, 1, 0)
            },
            segments: Vec::new(),
        };
        let added = FieldGeometryDecoder::new(&mut state)
            .decode(&def.encode())
            .unwrap();
        assert_eq!(added, 0);
        assert!(state.field(10).unwrap().is_empty());
    }

    #[test]
    fn geometry_malformed_command_leaves_state_unchanged() {
        let mut state = FieldMonitorState::new();
        let mut wire = two_point_field(1);
        wire[10] = b'N'; // "sRN field001"
        let result = FieldGeometryDecoder::new(&mut state).decode(&wire);
        assert!(matches!(result, Err(ProtocolError::MalformedCommand { .. })));
        assert_eq!(state, FieldMonitorState::new());
    }

    #[test]
    fn geometry_index_boundaries() {
        let mut state = FieldMonitorState::new();
        let mut decoder = FieldGeometryDecoder::new(&mut state);
        assert_eq!(decoder.decode(&two_point_field(0)).unwrap(), 2);
        assert_eq!(decoder.decode(&two_point_field(FIELD_CAPACITY - 1)).unwrap(), 2);

        for cmd in [&b"sRA field048 "[..], b"sRA field-1 "] {
            let mut payload = cmd.to_vec();
            payload.resize(60, 0);
            let wire = RawFrame::new(&payload).into_bytes();
            assert!(matches!(
                decoder.decode(&wire),
                Err(ProtocolError::FieldIndexOutOfRange { .. })
            ));
        }
        assert_eq!(state.field(0).unwrap().len(), 2);
        assert_eq!(state.field(47).unwrap().len(), 2);
    }

    #[test]
    fn geometry_truncated_point_list_leaves_state_unchanged() {
        let mut state = FieldMonitorState::new();
        let wire = two_point_field(3);
        let result = FieldGeometryDecoder::new(&mut state).decode(&wire[..50]);
        assert!(matches!(result, Err(ProtocolError::TruncatedMessage { .. })));
        assert!(state.field(3).unwrap().is_empty());
    }
}
