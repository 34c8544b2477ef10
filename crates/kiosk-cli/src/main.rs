//! Interactive station entry kiosk.
//!
//! Reads one command per line from stdin and renders the kiosk screen after
//! every change. Logs go to stderr.
//!
//! Usage:
//!   kiosk                              # default fare and timings
//!   kiosk --config kiosk.json          # override from a JSON file
//!   kiosk --log-level debug            # or RUST_LOG=kiosk_emulator=debug

mod console;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, bail};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use kiosk_core::KioskConfig;
use kiosk_emulator::{Kiosk, KioskCommand, KioskRuntime, TokioClock, VirtualDisplay};

use crate::console::{ConsoleDisplay, render_loop};

const HELP: &str = "\
Commands:
  coin <cents>        insert a coin
  card                start a card payment
  pay <number>        submit a payment card number
  qr <code>           scan a QR code
  tap <code>          tap a contactless card
  code <code>         enter an operator code
  passed              the visitor went through the gate
  drawer open|close   open or close the cash drawer
  zero yes|no         answer the zeroing prompt
  reset               force the kiosk back to idle
  status              print the kiosk state as JSON
  journal             print the maintenance journal as JSON
  help                show this list
  quit                exit";

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "kiosk")]
#[command(about = "Station entry kiosk emulator")]
struct Args {
    /// JSON configuration file; missing fields use the defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter, e.g. "info" or "kiosk_emulator=debug" (overrides RUST_LOG)
    #[arg(short, long)]
    log_level: Option<String>,
}

/// One parsed input line.
#[derive(Debug)]
enum CliCommand {
    Kiosk(KioskCommand),
    Status,
    Journal,
    Help,
    Quit,
}

fn parse_command(line: &str) -> anyhow::Result<CliCommand> {
    let mut words = line.split_whitespace();
    let verb = words.next().unwrap_or_default().to_ascii_lowercase();
    let arg = words.next();

    let require = |what: &str| -> anyhow::Result<String> {
        arg.map(str::to_string)
            .with_context(|| format!("'{verb}' needs {what}"))
    };

    let command = match verb.as_str() {
        "coin" => {
            let cents = require("a value in cents")?;
            let cents: u32 = cents
                .parse()
                .with_context(|| format!("'{cents}' is not a number of cents"))?;
            KioskCommand::InsertCoin(cents)
        }
        "card" => KioskCommand::StartCardPayment,
        "pay" => KioskCommand::SubmitCardNumber(require("a card number")?),
        "qr" => KioskCommand::VerifyQr(require("a code")?),
        "tap" => KioskCommand::VerifyCard(require("a code")?),
        "code" => KioskCommand::MaintenanceCode(require("a code")?),
        "passed" => KioskCommand::PersonPassed,
        "drawer" => match require("open or close")?.as_str() {
            "open" => KioskCommand::OpenDrawer,
            "close" => KioskCommand::CloseDrawer,
            other => bail!("unknown drawer action '{other}'"),
        },
        "zero" => match require("yes or no")?.as_str() {
            "yes" | "y" => KioskCommand::ConfirmZero(true),
            "no" | "n" => KioskCommand::ConfirmZero(false),
            other => bail!("expected yes or no, got '{other}'"),
        },
        "reset" => KioskCommand::Reset,
        "status" => return Ok(CliCommand::Status),
        "journal" => return Ok(CliCommand::Journal),
        "help" | "?" => return Ok(CliCommand::Help),
        "quit" | "exit" => return Ok(CliCommand::Quit),
        other => bail!("unknown command '{other}', type 'help'"),
    };
    Ok(CliCommand::Kiosk(command))
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref());

    let config = match &args.config {
        Some(path) => KioskConfig::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => KioskConfig::default(),
    };

    let screen = Arc::new(Mutex::new(VirtualDisplay::new()));
    let kiosk = Kiosk::builder()
        .with_config(config)
        .with_clock(TokioClock)
        .with_display(ConsoleDisplay::new(Arc::clone(&screen)))
        .build()?;

    let (handle, task) = KioskRuntime::spawn(kiosk);
    let renderer = tokio::spawn(render_loop(screen));
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_command(line) {
            Ok(CliCommand::Kiosk(command)) => {
                if !handle.send(command).await? {
                    println!("(refused)");
                }
            }
            Ok(CliCommand::Status) => {
                let snapshot = handle.snapshot().await?;
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            }
            Ok(CliCommand::Journal) => {
                let journal = handle.journal().await?;
                println!("{}", serde_json::to_string_pretty(&journal)?);
            }
            Ok(CliCommand::Help) => println!("{HELP}"),
            Ok(CliCommand::Quit) => break,
            Err(e) => eprintln!("{e:#}"),
        }
    }

    handle.shutdown().await?;
    let kiosk = task.await?;
    renderer.abort();
    info!(state = %kiosk.state(), "Kiosk stopped");
    Ok(())
}
