use clap::{Args, Subcommand};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod send;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a gateway and print dispatched messages.
    Serve(ServeArgs),
    /// Connect as the peer and deliver one message.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
    /// Port to listen on (0 picks an ephemeral port).
    #[arg(long, short = 'p', default_value_t = 12345)]
    pub port: u16,
    /// Message types to print (comma-separated). Omit to print every
    /// inbound message regardless of type.
    #[arg(long, value_delimiter = ',')]
    pub types: Vec<String>,
    /// Exit after printing N messages.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Gateway host to connect to.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
    /// Gateway port to connect to.
    #[arg(long, short = 'p', default_value_t = 12345)]
    pub port: u16,
    /// Message type identifier.
    #[arg(long = "type", short = 't')]
    pub msg_type: String,
    /// JSON object of payload fields.
    #[arg(long)]
    pub payload: Option<String>,
    /// Wait for one message from the gateway and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait when --wait is set (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
