//! Aggregated field monitoring state for one scanner connection.

use crate::error::{ProtocolError, Result};
use crate::protocol::Telegram;
use crate::protocol::field::{FieldDefinition, FieldHeader};

/// Number of monitoring field slots a scanner can report.
pub const FIELD_CAPACITY: usize = 48;

/// A field boundary point in the scanner's polar frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PolarPoint {
    /// Distance from the scanner origin (m)
    pub distance_m: f64,
    /// Scan angle (rad)
    pub angle_rad: f64,
}

/// Geometry of one monitoring field.
///
/// Points keep the order they were transmitted in, which is angular scan
/// order. Decoding appends; only [`FieldMonitorState::begin_field_definition`]
/// clears.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Field {
    points: Vec<PolarPoint>,
    header: Option<FieldHeader>,
}

impl Field {
    pub fn points(&self) -> &[PolarPoint] {
        &self.points
    }

    /// Scaling block of the most recent definition applied to this slot.
    pub fn header(&self) -> Option<&FieldHeader> {
        self.header.as_ref()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn clear(&mut self) {
        self.points.clear();
        self.header = None;
    }
}

/// What a successfully applied telegram changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    /// New active field set index (0-15)
    ActiveFieldSet(u8),
    /// `points` boundary points were appended to field `index`
    FieldGeometry { index: usize, points: usize },
    /// Telegram was recognised as not carrying field monitoring data
    Ignored { command: String },
}

/// Field table plus active field set for one monitored device.
///
/// Created per connection and passed by reference to the decoders. Access
/// from several threads must be serialised by the owner.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FieldMonitorState {
    /// Always exactly `FIELD_CAPACITY` slots
    fields: Vec<Field>,
    active_field_set: u8,
}

impl FieldMonitorState {
    pub fn new() -> Self {
        Self {
            fields: vec![Field::default(); FIELD_CAPACITY],
            active_field_set: 0,
        }
    }

    pub fn active_field_set(&self) -> u8 {
        self.active_field_set
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    /// Clear the slot for `index` ahead of a fresh definition.
    pub fn begin_field_definition(&mut self, index: usize) -> Result<()> {
        self.slot_mut(index)?.clear();
        Ok(())
    }

    /// Forget all geometry and return to field set 0.
    pub fn clear(&mut self) {
        for field in &mut self.fields {
            field.clear();
        }
        self.active_field_set = 0;
    }

    /// Apply an already decoded telegram.
    pub fn apply(&mut self, telegram: &Telegram) -> Result<Update> {
        match telegram {
            Telegram::InputState(state) => {
                let set = state.active_field_set();
                self.set_active_field_set(set);
                Ok(Update::ActiveFieldSet(set))
            }
            Telegram::FieldDefinition(def) => {
                let points = self.append_definition(def)?;
                Ok(Update::FieldGeometry {
                    index: def.field_index,
                    points,
                })
            }
            Telegram::Unknown { command, .. } => Ok(Update::Ignored {
                command: command.clone(),
            }),
        }
    }

    pub(crate) fn set_active_field_set(&mut self, set: u8) {
        if set != self.active_field_set {
            log::debug!("active field set {} -> {}", self.active_field_set, set);
        }
        self.active_field_set = set;
    }

    /// Append the definition's points to its slot. Returns the number appended.
    pub(crate) fn append_definition(&mut self, def: &FieldDefinition) -> Result<usize> {
        let slot = self.slot_mut(def.field_index)?;
        let before = slot.points.len();
        slot.points.extend(def.polar_points());
        slot.header = Some(def.header);

        let added = slot.points.len() - before;
        for p in &slot.points[before..] {
            log::trace!(
                "field {}: {:.3} m @ {:.4} rad",
                def.field_index,
                p.distance_m,
                p.angle_rad
            );
        }
        log::debug!(
            "field {}: +{} points ({} total, type {}, number {})",
            def.field_index,
            added,
            slot.points.len(),
            def.header.field_type,
            def.header.field_number,
        );
        Ok(added)
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut Field> {
        self.fields
            .get_mut(index)
            .ok_or(ProtocolError::FieldIndexOutOfRange {
                index: i64::try_from(index).unwrap_or(i64::MAX),
            })
    }
}

impl Default for FieldMonitorState {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::field::FieldSegment;
    use crate::protocol::input_state::LidInputState;

    fn definition(index: usize, stops: &[u16]) -> FieldDefinition {
        FieldDefinition {
            field_index: index,
            header: FieldHeader::segmented(1.0, 0.0, 1, 0),
            segments: stops
                .iter()
                .enumerate()
                .map(|(i, &stop_dist)| FieldSegment {
                    angle_index: i as u16,
                    start_dist: 0,
                    stop_dist,
                })
                .collect(),
        }
    }

    #[test]
    fn new_state_is_empty() {
        let state = FieldMonitorState::new();
        assert_eq!(state.fields().len(), FIELD_CAPACITY);
        assert!(state.fields().iter().all(Field::is_empty));
        assert_eq!(state.active_field_set(), 0);
        assert!(state.field(47).is_some());
        assert!(state.field(48).is_none());
    }

    #[test]
    fn apply_input_state() {
        let mut state = FieldMonitorState::new();
        let update = state
            .apply(&Telegram::InputState(LidInputState::from_field_set(9)))
            .unwrap();
        assert_eq!(update, Update::ActiveFieldSet(9));
        assert_eq!(state.active_field_set(), 9);
    }

    #[test]
    fn apply_definition_touches_only_its_slot() {
        let mut state = FieldMonitorState::new();
        let update = state
            .apply(&Telegram::FieldDefinition(definition(4, &[100, 200, 300])))
            .unwrap();
        assert_eq!(update, Update::FieldGeometry { index: 4, points: 3 });
        assert_eq!(state.field(4).unwrap().len(), 3);
        assert!(state.field(4).unwrap().header().is_some());
        for (i, field) in state.fields().iter().enumerate() {
            if i != 4 {
                assert!(field.is_empty(), "slot {i} touched");
            }
        }
    }

    #[test]
    fn points_append_in_transmitted_order() {
        let mut state = FieldMonitorState::new();
        state.append_definition(&definition(0, &[3000, 1000])).unwrap();
        state.append_definition(&definition(0, &[2000])).unwrap();
        let distances: Vec<f64> = state.field(0).unwrap().points().iter().map(|p| p.distance_m).collect();
        assert_eq!(distances, vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn out_of_range_definition_rejected() {
        let mut state = FieldMonitorState::new();
        let before = state.clone();
        assert!(matches!(
            state.append_definition(&definition(48, &[1])),
            Err(ProtocolError::FieldIndexOutOfRange { index: 48 })
        ));
        assert_eq!(state, before);
    }

    #[test]
    fn begin_field_definition_clears_one_slot() {
        let mut state = FieldMonitorState::new();
        state.append_definition(&definition(1, &[10, 20])).unwrap();
        state.append_definition(&definition(2, &[30])).unwrap();

        state.begin_field_definition(1).unwrap();
        assert!(state.field(1).unwrap().is_empty());
        assert!(state.field(1).unwrap().header().is_none());
        assert_eq!(state.field(2).unwrap().len(), 1);

        assert!(matches!(
            state.begin_field_definition(FIELD_CAPACITY),
            Err(ProtocolError::FieldIndexOutOfRange { .. })
        ));
    }

    #[test]
    fn clear_resets_everything() {
        let mut state = FieldMonitorState::new();
        state.append_definition(&definition(5, &[10])).unwrap();
        state.set_active_field_set(3);
        state.clear();
        assert_eq!(state, FieldMonitorState::new());
    }

    #[test]
    fn unknown_telegram_is_ignored() {
        let mut state = FieldMonitorState::new();
        let update = state
            .apply(&Telegram::Unknown {
                command: "sRA SCdevicestate ".into(),
                datagram: Vec::new(),
            })
            .unwrap();
        assert_eq!(
            update,
            Update::Ignored {
                command: "sRA SCdevicestate ".into()
            }
        );
        assert_eq!(state, FieldMonitorState::new());
    }
}
