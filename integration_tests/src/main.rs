//! Hardware-in-the-loop tests for the XBee LR driver.
//!
//! Run with a module attached over a USB serial adapter.

mod device;
mod tests;

use clap::Parser;
use colored::Colorize;
use futures::executor::block_on;
use tracing_subscriber::EnvFilter;
use xbee_modem::{Radio, XBeeLr};

use device::{resolve_port, SerialTransport};
use tests::{print_results, run_all_tests, Printer, TestOptions};

#[derive(Parser)]
#[command(name = "integration-tests")]
#[command(about = "Hardware tests for the XBee LR driver")]
struct Args {
    /// Serial port for the modem (use "auto" to auto-detect)
    #[arg(short, long, default_value = "auto")]
    port: String,

    /// Baud rate
    #[arg(short, long, default_value = "9600")]
    baud: u32,

    /// Application EUI to provision (16 hex characters)
    #[arg(long)]
    app_eui: Option<String>,

    /// Application key to provision (32 hex characters)
    #[arg(long)]
    app_key: Option<String>,

    /// Network key to provision (32 hex characters)
    #[arg(long)]
    nwk_key: Option<String>,

    /// Join the network and send an uplink
    #[arg(long)]
    join: bool,

    /// LoRaWAN port for the test uplink
    #[arg(long, default_value = "2")]
    uplink_port: u8,

    /// Show driver debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    // Resolve port (auto-detect if "auto")
    let port = resolve_port(&args.port)?;

    println!("{}", "XBee LR Integration Tests".bold());
    println!("Port: {}", port);
    println!("Baud: {}", args.baud);
    println!();

    println!("Opening modem...");
    let mut modem = XBeeLr::new(SerialTransport::new(), Printer);
    block_on(modem.init(args.baud, Some(&port)))
        .map_err(|e| anyhow::anyhow!("Failed to open {}: {}", port, e))?;
    println!("{}", "Opened!".green());

    println!("\nRunning tests...\n");

    let options = TestOptions {
        app_eui: args.app_eui,
        app_key: args.app_key,
        nwk_key: args.nwk_key,
        join: args.join,
        uplink_port: args.uplink_port,
    };
    let results = run_all_tests(&mut modem, &options);
    print_results(&results);

    let stats = modem.stats();
    println!(
        "Frames received: {}, decode errors: {}, unknown frames: {}",
        stats.frames_received, stats.decode_errors, stats.unknown_frames
    );

    // Exit with error code if any tests failed
    let failed = results.iter().filter(|r| !r.passed).count();
    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}
