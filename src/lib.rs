pub mod codec;
pub mod decoder;
pub mod error;
pub mod frame;
pub mod monitor;
pub mod protocol;
pub mod session;

pub use decoder::{FieldGeometryDecoder, FieldSetStateDecoder};
pub use error::ProtocolError;
pub use frame::{FrameSplitter, RawFrame};
pub use monitor::{FIELD_CAPACITY, Field, FieldMonitorState, PolarPoint, Update};
pub use protocol::Telegram;
pub use session::{FieldMonitor, GeometryUpdate, SessionConfig};
