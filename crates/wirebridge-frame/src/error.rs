/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended before a complete 4-byte length prefix arrived.
    #[error("stream closed before a length prefix")]
    StreamClosed,

    /// The stream ended after the length prefix but before the full payload.
    #[error("truncated frame ({received} of {expected} payload bytes)")]
    TruncatedFrame { expected: usize, received: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
