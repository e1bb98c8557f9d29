use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, error, info, warn};
use wirebridge_codec::MessageCodec;
use wirebridge_frame::{FrameConfig, FrameError};

use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::listener::spawn_inbound_listener;
use crate::registry::HandlerRegistry;

/// Owns the listening socket and the notion of "the current peer".
///
/// At most one peer connection is active at any instant. A new incoming
/// connection supersedes the previous one: the old connection's inbound
/// listener is cancelled and its socket shut down before the new connection
/// is adopted, so exactly one listener delivers messages at a time.
#[derive(Debug)]
pub struct ConnectionManager {
    listener: TcpListener,
    local_addr: SocketAddr,
    max_payload_size: usize,
    active: Mutex<Option<ActivePeer>>,
    shutdown: AtomicBool,
}

#[derive(Debug)]
struct ActivePeer {
    stream: TcpStream,
    addr: SocketAddr,
    cancel: Arc<AtomicBool>,
}

impl ActivePeer {
    fn teardown(&self) {
        self.cancel.store(true, Ordering::SeqCst);
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

impl ConnectionManager {
    /// Bind and begin listening on the configured address.
    ///
    /// A port conflict is fatal to startup and surfaced as
    /// [`GatewayError::Bind`].
    pub fn open(config: &GatewayConfig) -> Result<Self> {
        let listener =
            TcpListener::bind((config.host.as_str(), config.port)).map_err(|source| {
                GatewayError::Bind {
                    host: config.host.clone(),
                    port: config.port,
                    source,
                }
            })?;
        // Port 0 resolves to an ephemeral port at bind time.
        let local_addr = listener.local_addr().map_err(|source| GatewayError::Bind {
            host: config.host.clone(),
            port: config.port,
            source,
        })?;

        info!(%local_addr, "gateway listening");

        Ok(Self {
            listener,
            local_addr,
            max_payload_size: config.max_payload_size,
            active: Mutex::new(None),
            shutdown: AtomicBool::new(false),
        })
    }

    /// The bound address (useful when the configured port was 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Run the accept loop until `close` is called or accepting fails.
    ///
    /// Each accepted connection replaces the previous peer and gets its own
    /// inbound listener thread. On an I/O error while accepting, the loop
    /// logs and terminates; existing connections are left untouched.
    pub fn accept_loop(
        &self,
        registry: Arc<HandlerRegistry>,
        codec: Arc<dyn MessageCodec>,
    ) {
        loop {
            let (stream, peer_addr) = match self.listener.accept() {
                Ok(accepted) => accepted,
                Err(err) => {
                    if self.shutdown.load(Ordering::SeqCst) {
                        debug!("accept loop stopping");
                    } else {
                        error!(error = %err, "accept failed; no further peers will be accepted");
                    }
                    return;
                }
            };

            if self.shutdown.load(Ordering::SeqCst) {
                // Either the loopback nudge from close(), or a peer that
                // raced it; neither gets adopted.
                let _ = stream.shutdown(Shutdown::Both);
                debug!("accept loop stopping");
                return;
            }

            self.adopt(stream, peer_addr, &registry, &codec);
        }
    }

    /// Make `stream` the active peer, superseding and cancelling the previous
    /// one, and start an inbound listener bound to it.
    fn adopt(
        &self,
        stream: TcpStream,
        peer_addr: SocketAddr,
        registry: &Arc<HandlerRegistry>,
        codec: &Arc<dyn MessageCodec>,
    ) {
        let reader_stream = match stream.try_clone() {
            Ok(clone) => clone,
            Err(err) => {
                warn!(%peer_addr, error = %err, "could not clone accepted stream; dropping peer");
                return;
            }
        };

        let cancel = Arc::new(AtomicBool::new(false));
        let peer = ActivePeer {
            stream,
            addr: peer_addr,
            cancel: Arc::clone(&cancel),
        };

        let previous = {
            let mut active = self.lock_active();
            // close() takes the flag and then the lock in that order, so a
            // connection that raced it must not be adopted here.
            if self.shutdown.load(Ordering::SeqCst) {
                drop(active);
                peer.teardown();
                return;
            }
            active.replace(peer)
        };
        if let Some(previous) = previous {
            debug!(superseded = %previous.addr, new = %peer_addr, "replacing active peer");
            previous.teardown();
        } else {
            info!(%peer_addr, "peer connected");
        }

        let config = FrameConfig {
            max_payload_size: self.max_payload_size,
            ..FrameConfig::default()
        };
        let _inbound = spawn_inbound_listener(
            reader_stream,
            peer_addr,
            cancel,
            Arc::clone(registry),
            Arc::clone(codec),
            config,
        );
    }

    /// Stop accepting, cancel the active peer, and unblock the accept loop.
    ///
    /// Idempotent. The listening socket itself is released when the manager
    /// is dropped.
    pub fn close(&self) {
        if self.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }

        if let Some(active) = self.lock_active().take() {
            debug!(peer = %active.addr, "closing active peer");
            active.teardown();
        }

        // std's TcpListener has no cross-thread close; a loopback connect
        // wakes the blocked accept so the loop can observe the flag.
        let _ = TcpStream::connect(self.local_addr);
    }

    /// A writable handle to the current peer, or `None` when no peer is
    /// connected. Used only for sending, never to infer connection health.
    pub fn active_writer(&self) -> Result<Option<TcpStream>> {
        let active = self.lock_active();
        let Some(peer) = active.as_ref() else {
            return Ok(None);
        };
        let stream = peer
            .stream
            .try_clone()
            .map_err(|err| GatewayError::Send(FrameError::Io(err)))?;
        Ok(Some(stream))
    }

    /// Whether a peer connection is currently adopted.
    pub fn has_peer(&self) -> bool {
        self.lock_active().is_some()
    }

    fn lock_active(&self) -> std::sync::MutexGuard<'_, Option<ActivePeer>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
