use clap::{Args, Subcommand};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod emit;
pub mod listen;
pub mod publish;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Emit a named event, optionally waiting for the server ack.
    Emit(EmitArgs),
    /// Publish a payload to a channel.
    Publish(PublishArgs),
    /// Subscribe to channels and/or events and print inbound pushes.
    Listen(ListenArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Emit(args) => emit::run(args, format),
        Command::Publish(args) => publish::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// WebSocket URL of the SocketCluster endpoint (ws:// or wss://).
    pub url: String,
    /// JWT auth token to present in the handshake.
    #[arg(long, env = "SCLINK_AUTH_TOKEN")]
    pub token: Option<String>,
}

#[derive(Args, Debug)]
pub struct EmitArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// Event name to emit.
    #[arg(long, short = 'e')]
    pub event: String,
    /// JSON payload.
    #[arg(long, conflicts_with = "data")]
    pub json: Option<String>,
    /// Raw string payload.
    #[arg(long, conflicts_with = "json")]
    pub data: Option<String>,
    /// Wait for the server ack and print it.
    #[arg(long)]
    pub ack: bool,
    /// Maximum time to wait for the ack when --ack is set (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub ack_timeout: String,
}

#[derive(Args, Debug)]
pub struct PublishArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// Channel to publish to.
    #[arg(long, short = 'c')]
    pub channel: String,
    /// JSON payload.
    #[arg(long, conflicts_with = "data")]
    pub json: Option<String>,
    /// Raw string payload.
    #[arg(long, conflicts_with = "json")]
    pub data: Option<String>,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// Channels to subscribe to (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub channels: Vec<String>,
    /// Direct events to print (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub events: Vec<String>,
    /// Exit after printing N pushes.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
