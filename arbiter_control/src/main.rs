//! # Arbiter Control
//!
//! Runs the robot's cooperative scheduler at a fixed tick rate against the
//! simulation driver, optionally replaying a scripted operator session.
//!
//! A missing configuration file is not an error: the stock robot constants
//! are used. A configuration that exists but fails to parse or validate is
//! fatal.

use clap::Parser;
use arbiter_common::config::{ConfigError, LogLevel};
use arbiter_common::consts::DEFAULT_CONFIG_PATH;
use arbiter_control::config::{ControlConfig, load_config};
use arbiter_control::cycle::{CycleRunner, rt_setup};
use arbiter_control::hal::script::ScriptPlayer;
use arbiter_control::hal::sim::SimDriver;
use arbiter_control::robot::Robot;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Arbiter Control - cooperative mechanism scheduler
#[derive(Parser, Debug)]
#[command(name = "arbiter_control")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Tick-driven routine scheduler for competition robots")]
struct Args {
    /// Path to the control configuration TOML.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Operator input script to replay (TOML).
    #[arg(long, value_name = "FILE")]
    script: Option<PathBuf>,

    /// Stop after this many ticks (default: run until Ctrl-C).
    #[arg(long)]
    cycles: Option<u64>,

    /// Schedule the autonomous routine on the first tick.
    #[arg(long)]
    autonomous: bool,

    /// CPU core to pin the loop thread to (default: 1).
    #[arg(long, default_value_t = 1)]
    cpu_core: usize,

    /// SCHED_FIFO priority (default: 50).
    #[arg(long, default_value_t = 50)]
    rt_priority: i32,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    let config = load_config(&args.config);

    let level = match &config {
        Ok(c) => c.shared.log_level,
        Err(_) => LogLevel::Info,
    };
    setup_tracing(&args, level);

    info!("Arbiter Control v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match config {
        Ok(c) => c,
        Err(ConfigError::FileNotFound) => {
            warn!(
                "No config at '{}', using built-in defaults",
                args.config.display()
            );
            ControlConfig::default()
        }
        Err(e) => {
            error!("FATAL: {}: {e}", args.config.display());
            process::exit(1);
        }
    };

    if let Err(e) = run(&args, &config) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Arbiter Control shutdown complete");
}

fn run(args: &Args, config: &ControlConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        service = %config.shared.service_name,
        period_ms = config.cycle.period_ms,
        "Config OK"
    );

    let mut driver = SimDriver::new(config.cycle.period_ms);
    if let Some(path) = &args.script {
        let script = ScriptPlayer::load(path)
            .map_err(|e| format!("script {}: {e}", path.display()))?;
        info!("Loaded {} script steps from {}", script.len(), path.display());
        driver = driver.with_script(script);
    }

    let mut robot = Robot::build(config)?;
    if args.autonomous {
        robot.start_autonomous();
    }

    rt_setup(args.cpu_core, args.rt_priority)?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    let mut runner = CycleRunner::new(robot.scheduler, driver, &config.cycle);
    runner.run(&running, args.cycles)?;

    let stats = runner.stats();
    info!(
        "{} cycles, avg {} ns, max {} ns, {} overruns",
        stats.cycle_count,
        stats.avg_cycle_ns(),
        stats.max_cycle_ns,
        stats.overruns
    );
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
fn setup_tracing(args: &Args, level: LogLevel) {
    let directive = if args.verbose {
        "debug"
    } else {
        level.as_directive()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
