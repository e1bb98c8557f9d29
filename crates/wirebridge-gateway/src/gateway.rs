use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use tracing::{debug, error, info};
use wirebridge_codec::{JsonCodec, Message, MessageCodec};
use wirebridge_frame::{FrameConfig, FrameWriter};

use crate::config::GatewayConfig;
use crate::connection::ConnectionManager;
use crate::error::Result;
use crate::registry::{HandlerRegistry, MessageHandler};

/// The composition root: one TCP endpoint, one remote peer, typed messages
/// routed to registered handlers.
///
/// A gateway is an explicitly constructed value owned by the process's
/// composition root; `start`/`stop` are ordinary object lifecycle. Lifecycle
/// is two-state: Stopped and Running. Starting while Running and stopping
/// while Stopped are no-ops, and a stopped gateway may be started again.
pub struct Gateway {
    config: GatewayConfig,
    codec: Arc<dyn MessageCodec>,
    registry: Arc<HandlerRegistry>,
    state: Mutex<Option<Running>>,
}

struct Running {
    manager: Arc<ConnectionManager>,
    accept_thread: JoinHandle<()>,
}

impl Gateway {
    /// Create a stopped gateway with an injected payload codec.
    pub fn new(config: GatewayConfig, codec: Arc<dyn MessageCodec>) -> Self {
        Self {
            config,
            codec,
            registry: Arc::new(HandlerRegistry::new()),
            state: Mutex::new(None),
        }
    }

    /// Create a stopped gateway using the bundled JSON codec.
    pub fn with_default_codec(config: GatewayConfig) -> Self {
        Self::new(config, Arc::new(JsonCodec))
    }

    /// Open the listening socket and start accepting peers.
    ///
    /// No-op while already Running. The accept loop runs on its own thread;
    /// `start` returns as soon as the socket is bound.
    pub fn start(&self) -> Result<()> {
        let mut state = self.lock_state();
        if state.is_some() {
            debug!("gateway already running");
            return Ok(());
        }

        let manager = Arc::new(ConnectionManager::open(&self.config)?);

        let loop_manager = Arc::clone(&manager);
        let registry = Arc::clone(&self.registry);
        let codec = Arc::clone(&self.codec);
        let accept_thread = std::thread::spawn(move || {
            loop_manager.accept_loop(registry, codec);
        });

        *state = Some(Running {
            manager,
            accept_thread,
        });
        info!("gateway started");
        Ok(())
    }

    /// Stop accepting, tear down the active peer connection, and release the
    /// listening socket. Idempotent.
    pub fn stop(&self) {
        let running = self.lock_state().take();
        let Some(running) = running else {
            return;
        };

        running.manager.close();
        if running.accept_thread.join().is_err() {
            error!("accept loop thread panicked");
        }
        info!("gateway stopped");
    }

    /// Whether the gateway is currently Running.
    pub fn is_running(&self) -> bool {
        self.lock_state().is_some()
    }

    /// The port actually bound, or `None` while Stopped.
    pub fn local_port(&self) -> Option<u16> {
        self.lock_state()
            .as_ref()
            .map(|running| running.manager.local_addr().port())
    }

    /// Whether a peer is currently connected.
    pub fn has_peer(&self) -> bool {
        self.lock_state()
            .as_ref()
            .is_some_and(|running| running.manager.has_peer())
    }

    /// Send a message to the connected peer.
    ///
    /// Sending is advisory, not guaranteed: with no peer connected (or while
    /// Stopped) this succeeds without doing anything. A write that fails
    /// mid-frame is surfaced to the caller; there is no retry or buffering.
    pub fn send(&self, message: &Message) -> Result<()> {
        let manager = match self.lock_state().as_ref() {
            Some(running) => Arc::clone(&running.manager),
            None => {
                debug!(msg_type = message.msg_type(), "gateway stopped; dropping outbound message");
                return Ok(());
            }
        };

        let Some(stream) = manager.active_writer()? else {
            debug!(msg_type = message.msg_type(), "no peer connected; dropping outbound message");
            return Ok(());
        };

        let payload = self.codec.encode(message)?;
        let config = FrameConfig {
            max_payload_size: self.config.max_payload_size,
            ..FrameConfig::default()
        };
        let mut writer = FrameWriter::with_config(stream, config);
        writer.send(&payload)?;
        debug!(
            msg_type = message.msg_type(),
            bytes = payload.len(),
            "sent message to peer"
        );
        Ok(())
    }

    /// Register `handler` for messages of `msg_type`.
    pub fn register_handler(&self, msg_type: impl Into<String>, handler: Arc<dyn MessageHandler>) {
        self.registry.register(msg_type, handler);
    }

    /// Remove every registration of `handler` under `msg_type`.
    pub fn unregister_handler(&self, msg_type: &str, handler: &Arc<dyn MessageHandler>) {
        self.registry.unregister(msg_type, handler);
    }

    /// The handler registry, for callers that dispatch locally.
    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, Option<Running>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ephemeral_gateway() -> Gateway {
        Gateway::with_default_codec(GatewayConfig::new().with_port(0))
    }

    #[test]
    fn starts_and_stops() {
        let gateway = ephemeral_gateway();
        assert!(!gateway.is_running());

        gateway.start().unwrap();
        assert!(gateway.is_running());
        assert!(gateway.local_port().is_some());

        gateway.stop();
        assert!(!gateway.is_running());
        assert!(gateway.local_port().is_none());
    }

    #[test]
    fn start_twice_is_noop() {
        let gateway = ephemeral_gateway();
        gateway.start().unwrap();
        let port = gateway.local_port();
        gateway.start().unwrap();
        assert_eq!(gateway.local_port(), port);
        gateway.stop();
    }

    #[test]
    fn stop_twice_is_noop() {
        let gateway = ephemeral_gateway();
        gateway.start().unwrap();
        gateway.stop();
        gateway.stop();
    }

    #[test]
    fn restart_after_stop() {
        let gateway = ephemeral_gateway();
        gateway.start().unwrap();
        gateway.stop();
        gateway.start().unwrap();
        assert!(gateway.is_running());
        gateway.stop();
    }

    #[test]
    fn send_without_peer_is_silent_success() {
        let gateway = ephemeral_gateway();
        gateway.start().unwrap();
        gateway.send(&Message::new("ping")).unwrap();
        gateway.stop();
    }

    #[test]
    fn send_while_stopped_is_silent_success() {
        let gateway = ephemeral_gateway();
        gateway.send(&Message::new("ping")).unwrap();
    }

    #[test]
    fn bind_error_surfaces_from_start() {
        let first = ephemeral_gateway();
        first.start().unwrap();
        let port = first.local_port().unwrap();

        let second = Gateway::with_default_codec(GatewayConfig::new().with_port(port));
        let err = second.start().unwrap_err();
        assert!(matches!(err, crate::error::GatewayError::Bind { .. }));
        assert!(!second.is_running());

        first.stop();
    }
}
