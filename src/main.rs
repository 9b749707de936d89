//! Zomboid Arena entry point
//!
//! Headless runner: `zomboid-arena [config.json] [ticks]`. Runs the
//! simulation for a fixed number of ticks and prints a JSON summary.

use std::process::ExitCode;

use zomboid_arena::sim::SimController;
use zomboid_arena::{Result, SimConfig};

/// Default run length: one minute of simulated time
const DEFAULT_TICKS: u64 = 60 * 60;
/// Log the head count every this many ticks
const REPORT_EVERY: u64 = 600;

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Zomboid Arena starting...");

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    let ticks = match args.next() {
        Some(raw) => raw.parse::<u64>().map_err(|e| {
            zomboid_arena::SimError::Configuration(format!("invalid tick count {raw:?}: {e}"))
        })?,
        None => DEFAULT_TICKS,
    };

    let mut controller = SimController::new(config);
    controller.start()?;

    for tick in 1..=ticks {
        controller.tick();
        if tick % REPORT_EVERY != 0 {
            continue;
        }
        if let Some(summary) = controller.summary() {
            log::info!(
                "t={:.1}s humanoids={} infectoids={} zomboids={}",
                summary.time_ms / 1000.0,
                summary.humanoids,
                summary.infectoids,
                summary.zomboids
            );
        }
    }

    if let Some(summary) = controller.summary() {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    controller.stop();
    Ok(())
}
