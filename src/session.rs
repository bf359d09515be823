//! Per-connection field monitor: framing, routing, and state ownership.

use crate::error::Result;
use crate::frame::{self, DEFAULT_MAX_FRAME_LEN, FrameSplitter, RawFrame};
use crate::monitor::{FieldMonitorState, Update};
use crate::protocol::{Telegram, command_text};

/// How a complete field definition telegram changes its field slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeometryUpdate {
    /// Clear the slot, then store the new points. The slot always reflects
    /// the most recent definition.
    #[default]
    Replace,
    /// Append to whatever the slot already holds.
    Append,
}

/// Session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub geometry_update: GeometryUpdate,
    /// Largest declared telegram payload accepted from the stream (bytes)
    pub max_frame_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            geometry_update: GeometryUpdate::Replace,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

/// Field monitoring for one scanner connection.
///
/// Owns the [`FieldMonitorState`] for the lifetime of the connection. The
/// transport hands over either whole telegrams ([`deliver`](Self::deliver))
/// or raw stream bytes ([`feed`](Self::feed)). Errors are logged and
/// returned per telegram; none of them poison the session.
///
/// # Example
///
/// ```no_run
/// use fieldmon::FieldMonitor;
///
/// let mut monitor = FieldMonitor::new();
/// # let bytes_from_transport: Vec<u8> = Vec::new();
/// for result in monitor.feed(&bytes_from_transport) {
///     if let Err(e) = result {
///         eprintln!("discarded telegram: {e}");
///     }
/// }
/// println!("active field set: {}", monitor.state().active_field_set());
/// ```
pub struct FieldMonitor {
    state: FieldMonitorState,
    splitter: FrameSplitter,
    config: SessionConfig,
    /// Called after each successfully applied telegram.
    on_update: Option<Box<dyn FnMut(&Update, &FieldMonitorState)>>,
}

impl FieldMonitor {
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            state: FieldMonitorState::new(),
            splitter: FrameSplitter::with_max_frame_len(config.max_frame_len),
            config,
            on_update: None,
        }
    }

    pub fn state(&self) -> &FieldMonitorState {
        &self.state
    }

    /// Mutable access, e.g. for [`FieldMonitorState::begin_field_definition`]
    /// driven by an external dispatcher.
    pub fn state_mut(&mut self) -> &mut FieldMonitorState {
        &mut self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Register a callback invoked after every applied telegram.
    pub fn set_on_update(&mut self, f: impl FnMut(&Update, &FieldMonitorState) + 'static) {
        self.on_update = Some(Box::new(f));
    }

    /// Route one complete telegram (header included) to its decoder.
    pub fn deliver(&mut self, datagram: &[u8]) -> Result<Update> {
        let result = self.deliver_inner(datagram);
        match &result {
            Ok(update) => {
                if let Some(cb) = self.on_update.as_mut() {
                    cb(update, &self.state);
                }
            }
            Err(e) => log::warn!("discarding telegram {:?}: {e}", describe(datagram)),
        }
        result
    }

    /// Feed raw stream bytes. Returns one result per complete telegram found.
    pub fn feed(&mut self, data: &[u8]) -> Vec<Result<Update>> {
        self.splitter
            .feed(data)
            .into_iter()
            .map(|wire| {
                if frame::is_ascii_telegram(&wire) {
                    return self.deliver(&wire);
                }
                match RawFrame::parse(&wire) {
                    Ok(frame) => self.deliver(frame.as_bytes()),
                    Err(e) => {
                        log::warn!("discarding frame ({} bytes): {e}", wire.len());
                        Err(e)
                    }
                }
            })
            .collect()
    }

    /// Drop all state and any partially received telegram (e.g. on reconnect).
    pub fn reset(&mut self) {
        self.state.clear();
        self.splitter.reset();
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn deliver_inner(&mut self, datagram: &[u8]) -> Result<Update> {
        let telegram = Telegram::decode(datagram)?;
        if let Telegram::FieldDefinition(def) = &telegram {
            if self.config.geometry_update == GeometryUpdate::Replace {
                self.state.begin_field_definition(def.field_index)?;
            }
        }
        self.state.apply(&telegram)
    }
}

impl Default for FieldMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Short label for log lines.
fn describe(datagram: &[u8]) -> String {
    if frame::is_ascii_telegram(datagram) {
        String::from_utf8_lossy(&datagram[1..datagram.len().min(32)]).into_owned()
    } else {
        command_text(datagram)
    }
}

impl std::fmt::Debug for FieldMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldMonitor")
            .field("state", &self.state)
            .field("config", &self.config)
            .field("on_update", &self.on_update.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
