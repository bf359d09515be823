use thiserror::Error;

/// Errors arising from telegram framing and decoding.
///
/// Every variant is local to the telegram that produced it. Callers log and
/// discard the offending telegram; the monitor state is left untouched.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("telegram too short for {msg_type}: need {need} bytes, got {got}{}", format_raw_suffix(raw))]
    TruncatedMessage {
        msg_type: &'static str,
        need: usize,
        got: usize,
        /// Raw telegram bytes for debug context.
        raw: Vec<u8>,
    },

    #[error("malformed command (expected \"sRA field<N>\", got {command:?})")]
    MalformedCommand { command: String },

    #[error("field index {index} out of range (0..{})", crate::monitor::FIELD_CAPACITY)]
    FieldIndexOutOfRange { index: i64 },

    #[error("{what} is not implemented")]
    NotImplemented { what: &'static str },

    #[error("frame too short ({len} bytes, minimum 9)")]
    FrameTooShort { len: usize },

    #[error("missing start marker (expected 02 02 02 02)")]
    MissingStart,

    #[error("frame length mismatch (header declares {declared} payload bytes, got {got})")]
    LengthMismatch { declared: usize, got: usize },

    #[error("checksum mismatch (expected 0x{expected:02X}, computed 0x{computed:02X})")]
    ChecksumMismatch { expected: u8, computed: u8 },
}

impl ProtocolError {
    /// Create a `TruncatedMessage` error (raw bytes filled in later via `with_raw`).
    pub(crate) fn truncated(msg_type: &'static str, need: usize, got: usize) -> Self {
        Self::TruncatedMessage { msg_type, need, got, raw: Vec::new() }
    }

    /// Attach raw telegram bytes to truncation errors for diagnostics.
    pub fn with_raw(self, datagram: &[u8]) -> Self {
        match self {
            Self::TruncatedMessage { msg_type, need, got, .. } => {
                Self::TruncatedMessage { msg_type, need, got, raw: datagram.to_vec() }
            }
            other => other,
        }
    }
}

/// Format raw bytes as a suffix like " | 02020202..." (empty if no bytes).
fn format_raw_suffix(raw: &[u8]) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let limit = 16;
    let hex: String = raw.iter().take(limit).map(|b| format!("{b:02X}")).collect();
    let ellipsis = if raw.len() > limit { "..." } else { "" };
    format!(" | {hex}{ellipsis}")
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
