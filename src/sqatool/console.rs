use std::io::{self, BufRead};
use std::thread;
use std::time::Duration;

use clap::{Args, Parser, ValueEnum};
use sqatool::{
    CommandKey, DeviceModel, SerialLink,
    error::{LinkError, LinkResult},
    interface::{
        ComPortParams,
        serialport::{SerialPortOpener, available_ports},
    },
    resolve,
};
use tracing::error;

#[derive(Args, Debug, Clone)]
pub(crate) struct LinkArgs {
    /// Device model
    #[clap(short, long)]
    model: DeviceModel,

    /// Serial port, first available port if omitted
    #[clap(short, long)]
    serial: Option<String>,

    /// Baud rate
    #[clap(short, long)]
    baudrate: Option<u32>,
}

#[derive(Parser, Debug, Clone)]
pub(crate) struct SendOptions {
    #[command(flatten)]
    link: LinkArgs,

    /// How long to print replies before closing, in milliseconds
    #[clap(short, long, default_value_t = 1000)]
    listen_ms: u64,

    /// Command to send
    key: CommandKey,
}

#[derive(Parser, Debug, Clone)]
pub(crate) struct RawOptions {
    #[command(flatten)]
    link: LinkArgs,

    /// How long to print replies before closing, in milliseconds
    #[clap(short, long, default_value_t = 1000)]
    listen_ms: u64,

    /// Text to send as-is (the model terminator is still added)
    text: String,
}

#[derive(Parser, Debug, Clone)]
pub(crate) struct ConsoleOptions {
    #[command(flatten)]
    link: LinkArgs,
}

#[derive(Debug, PartialEq, Eq)]
enum ConsoleInput {
    Send(String),
    Help,
    Quit,
}

pub(crate) fn list_ports() -> LinkResult<()> {
    let ports = available_ports()?;
    if ports.is_empty() {
        println!("No serial ports found");
    }
    for port in ports {
        println!("{}", port);
    }
    Ok(())
}

pub(crate) fn handle_send(opts: SendOptions) -> LinkResult<()> {
    let command = lookup(opts.link.model, opts.key)?;
    send_and_listen(&opts.link, command, opts.listen_ms)
}

pub(crate) fn handle_raw(opts: RawOptions) -> LinkResult<()> {
    send_and_listen(&opts.link, &opts.text, opts.listen_ms)
}

pub(crate) fn handle_console(opts: ConsoleOptions) -> LinkResult<()> {
    let model = opts.link.model;
    let mut link = open_link(&opts.link)?;
    println!("Model {}. Type text to send, :<command> for the command table, :help, :quit", model);

    for line in io::stdin().lock().lines() {
        let line = line?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let text = match parse_input(input, model) {
            Ok(ConsoleInput::Send(text)) => text,
            Ok(ConsoleInput::Help) => {
                print_commands(model);
                continue;
            }
            Ok(ConsoleInput::Quit) => break,
            Err(e) => {
                error!("{}", e);
                continue;
            }
        };

        match link.send(&text, model) {
            Ok(()) => println!(">>> {} ({})", text, model),
            Err(e) if link.is_open() => error!("Send failed: {}", e),
            // Reconnect gave up, nothing left to talk to
            Err(e) => return Err(e),
        }
    }

    link.close();
    Ok(())
}

fn open_link(args: &LinkArgs) -> LinkResult<SerialLink> {
    let (port, baud) = ComPortParams {
        port: args.serial.clone(),
        baud: args.baudrate,
    }
    .resolve()?;

    let mut link = SerialLink::new(SerialPortOpener, |line| println!("<<< {}", line));
    link.open(&port, baud)?;

    Ok(link)
}

fn send_and_listen(args: &LinkArgs, text: &str, listen_ms: u64) -> LinkResult<()> {
    let mut link = open_link(args)?;

    link.send(text, args.model)?;
    println!(">>> {} ({})", text, args.model);

    thread::sleep(Duration::from_millis(listen_ms));
    link.close();
    Ok(())
}

fn lookup(model: DeviceModel, key: CommandKey) -> LinkResult<&'static str> {
    resolve(model, key).ok_or_else(|| LinkError::UnknownCommand {
        model: model.to_string(),
        key: key.to_string(),
    })
}

fn parse_input(input: &str, model: DeviceModel) -> LinkResult<ConsoleInput> {
    match input.strip_prefix(':') {
        None => Ok(ConsoleInput::Send(input.to_owned())),
        Some("quit") | Some("q") => Ok(ConsoleInput::Quit),
        Some("help") | Some("h") => Ok(ConsoleInput::Help),
        Some(name) => {
            let key = CommandKey::from_str(name, true).map_err(|_| LinkError::UnknownCommand {
                model: model.to_string(),
                key: name.to_owned(),
            })?;
            Ok(ConsoleInput::Send(lookup(model, key)?.to_owned()))
        }
    }
}

fn print_commands(model: DeviceModel) {
    for key in CommandKey::value_variants() {
        if let Some(literal) = resolve(model, *key) {
            println!("  :{:<14} {}", key.to_string(), literal);
        }
    }
}
