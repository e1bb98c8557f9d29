use std::net::{SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::{debug, warn};
use wirebridge_codec::MessageCodec;
use wirebridge_frame::{FrameConfig, FrameError, FrameReader};

use crate::registry::HandlerRegistry;

/// Spawn the per-connection inbound listener thread.
///
/// The thread blocks reading frames off the connection, decodes each payload
/// into a message, and dispatches it through the registry. It exits when the
/// stream closes, when an unrecoverable read error occurs, or when `cancel`
/// is signalled (the connection manager also shuts the socket down so a
/// blocked read wakes promptly).
pub(crate) fn spawn_inbound_listener(
    stream: TcpStream,
    peer_addr: SocketAddr,
    cancel: Arc<AtomicBool>,
    registry: Arc<HandlerRegistry>,
    codec: Arc<dyn MessageCodec>,
    config: FrameConfig,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        run_inbound_loop(stream, peer_addr, &cancel, &registry, codec.as_ref(), config);
    })
}

fn run_inbound_loop(
    stream: TcpStream,
    peer_addr: SocketAddr,
    cancel: &AtomicBool,
    registry: &HandlerRegistry,
    codec: &dyn MessageCodec,
    config: FrameConfig,
) {
    let mut reader = FrameReader::with_config(stream, config);
    debug!(%peer_addr, "inbound listener started");

    loop {
        let payload = match reader.read_frame() {
            Ok(payload) => payload,
            Err(err) => {
                log_listener_exit(peer_addr, cancel.load(Ordering::SeqCst), &err);
                break;
            }
        };

        if cancel.load(Ordering::SeqCst) {
            debug!(%peer_addr, "inbound listener cancelled");
            break;
        }

        // A frame that fails to decode is dropped; the connection stays live.
        match codec.decode(&payload) {
            Ok(message) => {
                debug!(%peer_addr, msg_type = message.msg_type(), "dispatching inbound message");
                registry.dispatch(&message);
            }
            Err(error) => {
                warn!(%peer_addr, %error, frame_len = payload.len(), "dropping undecodable frame");
            }
        }
    }
}

fn log_listener_exit(peer_addr: SocketAddr, cancelled: bool, err: &FrameError) {
    if cancelled {
        debug!(%peer_addr, "inbound listener cancelled");
        return;
    }
    match err {
        FrameError::StreamClosed => debug!(%peer_addr, "peer closed connection"),
        FrameError::TruncatedFrame { expected, received } => warn!(
            %peer_addr,
            expected, received, "connection ended mid-frame"
        ),
        other => warn!(%peer_addr, error = %other, "inbound read failed"),
    }
}
