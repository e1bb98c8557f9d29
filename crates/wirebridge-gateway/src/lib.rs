//! Single-peer TCP message gateway with type-keyed handler dispatch.
//!
//! A [`Gateway`] exposes one TCP endpoint to a single remote peer and
//! exchanges discrete, typed messages with it over length-prefixed framing.
//! Inbound messages are routed to handlers registered by message type;
//! outbound messages go to whichever peer is currently connected. This is
//! deliberately not a broker: at most one peer is live at a time, messages
//! are fire-and-forget, and nothing is buffered across reconnects.

pub mod config;
pub mod connection;
pub mod error;
pub mod gateway;
mod listener;
pub mod registry;

pub use config::{GatewayConfig, DEFAULT_HOST, DEFAULT_PORT};
pub use connection::ConnectionManager;
pub use error::{GatewayError, Result};
pub use gateway::Gateway;
pub use registry::{HandlerError, HandlerRegistry, MessageHandler};

// Re-export the codec seam so embedders only need this crate.
pub use wirebridge_codec::{JsonCodec, Message, MessageCodec};
