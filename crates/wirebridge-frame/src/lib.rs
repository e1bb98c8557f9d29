//! Length-prefixed binary message framing for the wirebridge gateway.
//!
//! Every message on the wire is framed with a 4-byte big-endian payload
//! length followed by that many payload bytes. No magic number, no version
//! byte, no checksum. No partial reads, no buffer management in user code.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_frame, encode_frame, FrameConfig, DEFAULT_MAX_PAYLOAD, LENGTH_PREFIX_SIZE,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
