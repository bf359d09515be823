//! Telegram types and decode dispatch.
//!
//! - [`input_state::LidInputState`] — which field set the scanner has active
//! - [`field::FieldDefinition`] — geometry of one monitoring field
//!
//! Telegrams are classified by their command text, which starts right after
//! the 8-byte binary header: `<method> <name> <data...>`, e.g.
//! `sSN LIDinputstate ` or `sRA field007 `.

pub mod field;
pub mod input_state;

use crate::error::{ProtocolError, Result};
use crate::frame::{self, HEADER_LEN};

// ---------------------------------------------------------------------------
// Command names
// ---------------------------------------------------------------------------

pub const METHOD_READ_ANSWER: &str = "sRA";
pub const METHOD_EVENT: &str = "sSN";
pub const NAME_INPUT_STATE: &str = "LIDinputstate";
pub const NAME_FIELD_PREFIX: &str = "field";

// ---------------------------------------------------------------------------
// Telegram — one decoded device → host message
// ---------------------------------------------------------------------------

/// A field monitoring telegram received from the scanner.
#[derive(Debug, Clone)]
pub enum Telegram {
    InputState(input_state::LidInputState),
    FieldDefinition(field::FieldDefinition),

    // -- Forward compat --
    Unknown { command: String, datagram: Vec<u8> },
}

impl Telegram {
    /// Classify and decode one complete telegram (header included).
    ///
    /// ASCII telegrams are recognised and rejected with `NotImplemented`.
    pub fn decode(datagram: &[u8]) -> Result<Self> {
        if frame::is_ascii_telegram(datagram) {
            let text = printable_prefix(&datagram[1..]);
            return match split_command(&text) {
                (METHOD_EVENT | METHOD_READ_ANSWER, NAME_INPUT_STATE) => {
                    input_state::LidInputState::decode_ascii(datagram).map(Telegram::InputState)
                }
                (METHOD_READ_ANSWER, name) if name.starts_with(NAME_FIELD_PREFIX) => {
                    field::FieldDefinition::decode_ascii(datagram).map(Telegram::FieldDefinition)
                }
                _ => Err(ProtocolError::NotImplemented {
                    what: "ASCII telegram",
                }),
            };
        }

        let command = command_text(datagram);
        if let (METHOD_EVENT | METHOD_READ_ANSWER, NAME_INPUT_STATE) = split_command(&command) {
            return Ok(Telegram::InputState(input_state::LidInputState::decode(
                datagram,
            )?));
        }

        // Same grammar as the geometry decoder: anything that is not a
        // well-formed `sRA field<N>` is some other telegram.
        match field::parse_field_command(datagram) {
            Err(ProtocolError::MalformedCommand { .. }) => Ok(Telegram::Unknown {
                command,
                datagram: datagram.to_vec(),
            }),
            _ => Ok(Telegram::FieldDefinition(field::FieldDefinition::decode(
                datagram,
            )?)),
        }
    }
}

/// Command text of a binary telegram: the printable run starting at offset 8.
///
/// Binary data follows the command without a terminator, so a printable data
/// byte may trail the text. Callers match on whitespace-separated tokens.
pub fn command_text(datagram: &[u8]) -> String {
    printable_prefix(datagram.get(HEADER_LEN..).unwrap_or_default())
}

fn printable_prefix(bytes: &[u8]) -> String {
    let end = bytes
        .iter()
        .position(|&b| !(0x20..=0x7E).contains(&b))
        .unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Split `"<method> <name> ..."` into `(method, name)`.
fn split_command(text: &str) -> (&str, &str) {
    let mut tokens = text.split_ascii_whitespace();
    let method = tokens.next().unwrap_or_default();
    let name = tokens.next().unwrap_or_default();
    (method, name)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
