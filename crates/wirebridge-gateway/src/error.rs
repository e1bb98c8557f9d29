use wirebridge_codec::CodecError;
use wirebridge_frame::FrameError;

/// Errors surfaced by the gateway to its callers.
///
/// Failures local to one connection or one handler are contained and logged
/// where they happen; only bind failures and outbound send failures reach the
/// caller.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The listening port was unavailable at startup. Fatal to `start`.
    #[error("failed to bind {host}:{port}: {source}")]
    Bind {
        host: String,
        port: u16,
        source: std::io::Error,
    },

    /// An outbound message could not be serialized.
    #[error("outbound encode failed: {0}")]
    Encode(#[from] CodecError),

    /// Writing an outbound frame to the connected peer failed.
    #[error("send failed: {0}")]
    Send(#[from] FrameError),
}

pub type Result<T> = std::result::Result<T, GatewayError>;
