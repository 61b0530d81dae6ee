pub mod parser;
pub mod types;
pub mod writer;

pub use parser::{frame_len, parse};
pub use types::RespValue;

/// Negotiated wire protocol version.
///
/// RESP3 (HELLO 3) makes the server emit native map/set/double/boolean
/// frames where RESP2 uses flat arrays and strings; parsers that must
/// normalize both shapes receive this explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Resp2,
    Resp3,
}
