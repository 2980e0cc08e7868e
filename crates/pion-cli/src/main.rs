//! The `pion` binary.
//!
//! Loads a platform configuration, assembles the runtime, and serves
//! until interrupted.
//!
//! # Environment Variables
//!
//! - `PION_LOG`: tracing filter (e.g. `info`, `pion_engine=debug`),
//!   overriding `--debug`/`--verbose`

use anyhow::{Context, Result};
use clap::Parser;
use pion_platform::{Platform, PlatformConfig};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Pion - lightweight HTTP services and event-processing pipelines
#[derive(Parser, Debug)]
#[command(name = "pion")]
#[command(version, about, long_about = None)]
struct Args {
    /// Platform configuration file (TOML)
    #[arg(short, long)]
    config: PathBuf,

    /// Override the worker thread count
    #[arg(long)]
    threads: Option<usize>,

    /// Override the first server's port
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose (trace) logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(args: &Args) {
    let default_level = if args.verbose {
        "trace"
    } else if args.debug {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_env("PION_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args);

    let mut config = PlatformConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(threads) = args.threads {
        config.scheduler.threads = Some(threads);
    }
    if let Some(port) = args.port {
        match config.servers.first_mut() {
            Some(section) => section.server.port = port,
            None => anyhow::bail!("--port given but the configuration defines no servers"),
        }
    }

    let platform = Platform::build(config).context("assembling platform")?;
    platform.start().context("starting platform")?;
    for server in platform.servers() {
        if let Some(addr) = server.local_addr() {
            info!(addr = %addr, "serving");
        }
    }

    platform.wait_for_interrupt()?;
    info!("interrupt received; shutting down");
    platform.stop();
    Ok(())
}
