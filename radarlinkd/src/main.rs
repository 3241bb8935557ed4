//! RadarLink Agent
//!
//! Reads JSON records from a radar sensor on a serial port and forwards the
//! distances to an HTTP collector.
//!
//! # Device selection
//!
//! The device comes from `--device`, `RADARLINK_DEVICE`, or `[device] path`
//! in the config file, in that order of precedence. With none of them set,
//! the agent lists the available ports and asks which one to use. The name
//! `test` selects a synthetic device that needs no hardware.

use anyhow::{Context, Result};
use clap::Parser;
use radarlink_core::{default_config_path, StaticConfig};
use radarlink_serial::{enumerate_devices, RecordReader};
use radarlinkd::format::format_devices;
use radarlinkd::select::prompt_for_device;
use radarlinkd::{HttpForwarder, Relay};
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info};

/// RadarLink serial-to-HTTP relay
#[derive(Parser, Debug)]
#[command(name = "radarlinkd")]
#[command(version, about = "Relay radar sensor records from a serial port to an HTTP collector", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial device path (e.g., /dev/ttyUSB0, COM3), or "test" for the synthetic device
    #[arg(short, long)]
    device: Option<String>,

    /// Serial baud rate
    #[arg(short, long)]
    baud_rate: Option<u32>,

    /// Collector endpoint URL
    #[arg(short, long)]
    target_url: Option<String>,

    /// List available devices and exit
    #[arg(short, long)]
    list: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(args.verbose);

    if args.list {
        let devices = enumerate_devices(true)?;
        println!("{}", format_devices(&devices));
        return Ok(());
    }

    // Config path: CLI flag > env var > default
    let config_path = args.config.clone().unwrap_or_else(|| {
        std::env::var("RADARLINK_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_config_path())
    });
    info!("Configuration file: {}", config_path.display());

    let config = load_config(&config_path, &args)?;

    let forwarder = HttpForwarder::new(&config.forwarder)?;
    if let Err(e) = forwarder.check_reachable().await {
        error!(
            "Cannot reach the collector at {:?}: {:#}. Start the collector server and try again.",
            forwarder.target_url(),
            e
        );
        std::process::exit(1);
    }
    info!("Collector reachable at {}", forwarder.target_url());

    let identifier = match config.device.path.clone() {
        Some(path) => path,
        None => {
            let devices = enumerate_devices(true)?;
            let stdin = std::io::stdin();
            prompt_for_device(&devices, &mut stdin.lock(), &mut std::io::stdout())?.name
        }
    };

    let device = match radarlink_serial::open(&identifier, config.device.baud_rate) {
        Ok(device) => device,
        Err(e) => {
            error!("{}. Use --device test to run without hardware.", e);
            std::process::exit(1);
        }
    };

    let reader = RecordReader::with_poll_interval(device, config.device.poll_interval());
    let relay = Relay::new(forwarder, config.forwarder.cycle_delay());

    info!("Relaying from {} to {}", identifier, config.forwarder.target_url);
    relay.run(reader, shutdown_signal()).await?;

    info!("Shutdown complete");
    Ok(())
}

/// Defaults < config file < environment < CLI flags
fn load_config(path: &std::path::Path, args: &Args) -> Result<StaticConfig> {
    let mut config = StaticConfig::load(path)?;
    config.apply_env_overrides()?;

    if let Some(device) = &args.device {
        config.device.path = Some(device.clone());
    }
    if let Some(baud_rate) = args.baud_rate {
        config.device.baud_rate = baud_rate;
    }
    if let Some(url) = &args.target_url {
        config.forwarder.target_url = url.clone();
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        },
    }
}

/// Initialize tracing subscriber for logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
