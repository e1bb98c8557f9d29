/// Errors that can occur while encoding or decoding message payloads.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Inbound bytes did not decode to a valid message.
    #[error("malformed message payload: {0}")]
    Decode(#[source] serde_json::Error),

    /// A message could not be serialized.
    #[error("message serialization failed: {0}")]
    Encode(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CodecError>;
