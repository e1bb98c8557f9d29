use crate::error::{CodecError, Result};
use crate::message::Message;
use crate::MessageCodec;

/// Default codec: messages as UTF-8 JSON objects.
///
/// `{"type": "...", "payload": {...}}`, with `payload` omitted when empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl MessageCodec for JsonCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Message> {
        serde_json::from_slice(bytes).map_err(CodecError::Decode)
    }

    fn encode(&self, message: &Message) -> Result<Vec<u8>> {
        serde_json::to_vec(message).map_err(CodecError::Encode)
    }
}
