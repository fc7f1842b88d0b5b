//! # OLR Engine
//!
//! Runs the race engine against the wall clock.
//!
//! Command lines are read from stdin, telemetry snapshots and command replies
//! are written to stdout as JSON lines, logs go to stderr. The LED strip is
//! simulated by a trace-level driver.

use clap::Parser;
use olr_common::config::{ConfigLoader, LogLevel, OlrConfig};
use olr_common::consts::{DEFAULT_CONFIG_PATH, LapNumber};
use olr_engine::config::{ConfigOverrides, load_config};
use olr_engine::cycle::EngineRunner;
use olr_engine::output::{JsonLines, TraceStrip};
use std::io::BufRead;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::Ordering;
use std::sync::mpsc;
use std::thread;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// OLR Engine: LED race physics and visualization
#[derive(Parser, Debug)]
#[command(name = "olr_engine")]
#[command(author = "OLR")]
#[command(version)]
#[command(about = "Fixed-tick race physics and LED rendering for a one-dimensional track")]
struct Args {
    /// Path to the engine configuration TOML.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the number of LEDs on the strip.
    #[arg(long, value_name = "N")]
    strip_length: Option<usize>,

    /// Override the number of laps to win.
    #[arg(long, value_name = "N")]
    laps: Option<LapNumber>,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    // Level only; errors are reported by the full load below.
    let file_level = OlrConfig::load(&args.config)
        .map(|c| c.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, file_level);

    info!("OLR Engine v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("OLR Engine shutdown complete");
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let overrides = ConfigOverrides {
        strip_length: args.strip_length,
        total_laps: args.laps,
    };
    let config = load_config(&args.config, &overrides)?;
    info!(
        "Service '{}' on {}:{}",
        config.shared.service_name, config.network.hostname, config.network.web_port
    );

    let strip = TraceStrip::new(config.led.pin, config.led.strip_length);
    let sink = JsonLines::new(std::io::stdout());
    let mut runner = EngineRunner::new(&config, strip, sink)?;

    let (tx, rx) = mpsc::channel::<String>();
    thread::Builder::new()
        .name("olr-stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) if line.trim().is_empty() => continue,
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("stdin read failed: {e}");
                        break;
                    }
                }
            }
            debug!("stdin reader finished");
        })?;

    let running = runner.running_flag();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        running.store(false, Ordering::SeqCst);
    })?;

    info!("Engine initialized, entering scheduler loop");
    runner.run(&rx);
    Ok(())
}

/// Setup tracing subscriber on stderr.
fn setup_tracing(args: &Args, file_level: LogLevel) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        file_level.as_str().parse().unwrap_or(Level::INFO)
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}
