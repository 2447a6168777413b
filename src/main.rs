//! Binary entrypoint for picture-flipper.
//!
//! Wires the library to a PNG-writing surface and a line-based command reader
//! on stdin standing in for the context menu.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use picture_flipper::catalog;
use picture_flipper::config::Configuration;
use picture_flipper::driver::Driver;
use picture_flipper::events::Command;
use picture_flipper::rotation::RotationEngine;
use picture_flipper::surface::PngSurface;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Parser)]
#[command(name = "picture-flipper", version, about = "Random picture slideshow")]
struct Cli {
    /// Path to YAML config file (or legacy `.json`)
    #[arg(short, long, value_name = "FILE", default_value = "picture_flipper.yaml")]
    config: PathBuf,

    /// Override per-image delay (ms)
    #[arg(long, value_name = "MILLIS")]
    delay_ms: Option<u64>,

    /// Deterministic seed for picture selection
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Where the current picture is written
    #[arg(short, long, value_name = "FILE", default_value = "current.png")]
    output: PathBuf,

    /// Initial viewport width
    #[arg(long, default_value_t = 400, value_parser = clap::value_parser!(u32).range(1..))]
    width: u32,

    /// Initial viewport height
    #[arg(long, default_value_t = 300, value_parser = clap::value_parser!(u32).range(1..))]
    height: u32,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    // map -v to log level
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("picture_flipper={level}").parse()?);
    fmt().with_env_filter(filter).with_target(true).init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let mut cfg = Configuration::from_file(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    if let Some(ms) = cli.delay_ms {
        cfg.delay_milliseconds = ms;
    }
    let cfg = cfg.validated().context("validating configuration")?;
    info!(title = cfg.title(), "configuration loaded");

    let pool = catalog::build(&cfg.directories, &cfg.extensions)
        .context("building picture catalog")?;

    let engine = match cli.seed {
        Some(seed) => RotationEngine::seeded(pool, seed),
        None => RotationEngine::from_os_rng(pool),
    };
    let surface = PngSurface::new(cli.output, cli.width, cli.height).with_title(cfg.title());
    let driver = Driver::new(engine, surface, cfg.delay(), cfg.override_file.clone());

    // Single thread: ticks, commands and rendering never run concurrently.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building runtime")?;
    let result = runtime.block_on(run(driver));
    // The stdin reader may still be parked in a blocking read.
    runtime.shutdown_background();
    result
}

async fn run(driver: Driver<PngSurface>) -> Result<()> {
    let (command_tx, command_rx) = mpsc::channel::<Command>(16);
    let cancel = CancellationToken::new();

    // stdin lines are menu actions; EOF only closes the channel
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => {}
                Ok(Some(line)) => match line.parse::<Command>() {
                    Ok(command) => {
                        if command_tx.send(command).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!("{err}"),
                },
                Ok(None) => {
                    info!("stdin closed; slideshow keeps running without commands");
                    break;
                }
                Err(err) => {
                    warn!("stdin reader failed: {err}");
                    break;
                }
            }
        }
    });

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("ctrl-c received; initiating shutdown");
                cancel.cancel();
            }
        });
    }

    driver.run(command_rx, cancel).await
}
