use clap::{Parser, Subcommand};
use console::{
    ConsoleOptions, RawOptions, SendOptions, handle_console, handle_raw, handle_send, list_ports,
};
use sqatool::error::LinkResult;

mod console;

#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
struct Cli {
    /// Show debug logging
    #[clap(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// List serial ports present on this machine
    #[command(name = "ports", alias = "l")]
    Ports,

    /// Send a command from the model's command table
    #[command(name = "send", alias = "s")]
    Send(SendOptions),

    /// Send free-form text
    #[command(name = "raw", alias = "r")]
    Raw(RawOptions),

    /// Interactive session with the device
    #[command(name = "console", alias = "c")]
    Console(ConsoleOptions),
}

fn main() -> LinkResult<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    match cli.command {
        Command::Ports => list_ports()?,
        Command::Send(opts) => handle_send(opts)?,
        Command::Raw(opts) => handle_raw(opts)?,
        Command::Console(opts) => handle_console(opts)?,
    }

    Ok(())
}
