//! Typed message model and pluggable payload codecs for wirebridge.
//!
//! The gateway core is codec-agnostic: it moves opaque byte payloads and
//! routes decoded [`Message`] values by type identifier. Which encoding the
//! bytes use is decided at composition time by injecting a [`MessageCodec`].
//! [`JsonCodec`] is the bundled default.

pub mod error;
pub mod json;
pub mod message;

pub use error::{CodecError, Result};
pub use json::JsonCodec;
pub use message::Message;

/// Converts messages to and from raw byte payloads.
///
/// Implementations must be deterministic and side-effect-free: `decode`
/// reconstructs exactly the message a matching `encode` produced. Codecs are
/// shared across threads and may be invoked concurrently.
pub trait MessageCodec: Send + Sync {
    /// Reconstruct a message from payload bytes.
    fn decode(&self, bytes: &[u8]) -> Result<Message>;

    /// Serialize a message to payload bytes.
    fn encode(&self, message: &Message) -> Result<Vec<u8>>;
}
