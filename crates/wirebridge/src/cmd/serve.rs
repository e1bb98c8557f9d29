use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use wirebridge_codec::{CodecError, JsonCodec, Message, MessageCodec};
use wirebridge_gateway::{Gateway, GatewayConfig, HandlerError, MessageHandler};

use crate::cmd::ServeArgs;
use crate::exit::{gateway_error, CliError, CliResult, SUCCESS};
use crate::output::{print_message, OutputFormat};

struct PrintHandler {
    format: OutputFormat,
    printed: Arc<AtomicUsize>,
}

impl MessageHandler for PrintHandler {
    fn handle_message(&self, message: &Message) -> Result<(), HandlerError> {
        print_message(message, self.format);
        self.printed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// JSON codec that prints every message it decodes. Registrations are
/// exact-type only, so serving without a `--types` filter taps the codec
/// seam instead of enumerating types up front.
struct PrintingCodec {
    format: OutputFormat,
    printed: Arc<AtomicUsize>,
}

impl MessageCodec for PrintingCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Message, CodecError> {
        let message = JsonCodec.decode(bytes)?;
        print_message(&message, self.format);
        self.printed.fetch_add(1, Ordering::SeqCst);
        Ok(message)
    }

    fn encode(&self, message: &Message) -> Result<Vec<u8>, CodecError> {
        JsonCodec.encode(message)
    }
}

pub fn run(args: ServeArgs, format: OutputFormat) -> CliResult<i32> {
    let printed = Arc::new(AtomicUsize::new(0));
    let gateway = build_gateway(&args, format, &printed);

    gateway
        .start()
        .map_err(|err| gateway_error("start failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(Arc::clone(&running))?;

    while running.load(Ordering::SeqCst) {
        if let Some(count) = args.count {
            if printed.load(Ordering::SeqCst) >= count {
                break;
            }
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    gateway.stop();
    Ok(SUCCESS)
}

/// With a `--types` filter: a printing handler registered per listed type.
/// Without one: a printing codec, so every inbound type is shown.
fn build_gateway(args: &ServeArgs, format: OutputFormat, printed: &Arc<AtomicUsize>) -> Gateway {
    let config = GatewayConfig::new()
        .with_host(args.host.clone())
        .with_port(args.port);

    if args.types.is_empty() {
        return Gateway::new(
            config,
            Arc::new(PrintingCodec {
                format,
                printed: Arc::clone(printed),
            }),
        );
    }

    let gateway = Gateway::with_default_codec(config);
    let handler: Arc<dyn MessageHandler> = Arc::new(PrintHandler {
        format,
        printed: Arc::clone(printed),
    });
    for msg_type in &args.types {
        gateway.register_handler(msg_type.clone(), Arc::clone(&handler));
    }
    gateway
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
