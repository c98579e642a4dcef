//! GroundLink ground station - Main Entry Point
//!
//! Runs the station against the configured sources and reads operator
//! commands from stdin, one per line.

use anyhow::Context;
use crossbeam_channel::Sender;
use groundlink_rs::{
    config::{LoggingSettings, StationConfig},
    runtime::Runtime,
    time_fmt, timer::SystemClock,
    CommandOutcome, ControlCommand, GroundStation,
};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_logging(settings: &LoggingSettings) -> Option<WorkerGuard> {
    let (file_layer, guard) = match &settings.directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "groundlink.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.filter)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    guard
}

/// Forward stdin lines to the station loop until EOF or quit
fn spawn_command_reader(cmd_tx: Sender<ControlCommand>, running: Arc<AtomicBool>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<ControlCommand>() {
                Ok(command) => {
                    let quit = command == ControlCommand::Quit;
                    if cmd_tx.send(command).is_err() || quit {
                        break;
                    }
                }
                Err(e) => eprintln!("{}", e),
            }
            if !running.load(Ordering::Relaxed) {
                break;
            }
        }
        tracing::debug!("Command reader exiting");
    });
}

fn report(outcome: &CommandOutcome) {
    match outcome {
        CommandOutcome::Exported(content) => println!("{}", content),
        CommandOutcome::Written(path) => println!("Exported to {}", path.display()),
        CommandOutcome::Loaded(len) => println!("Loaded {} records", len),
        CommandOutcome::Speed(speed) => println!("Playback speed {}x", speed),
        CommandOutcome::Status(status) => println!("{}", status),
        CommandOutcome::Done | CommandOutcome::Quit => {}
    }
}

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = match &config_path {
        Some(path) => StationConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => StationConfig::load_or_default(None),
    };

    let _log_guard = init_logging(&config.logging);
    tracing::info!("Starting GroundLink ground station");

    let mut station = GroundStation::from_config(&config);

    // Display collaborator: one line per record on the consumer feed
    let mut previous: Option<u64> = None;
    station.on_combined_record(move |record| {
        let gap = previous.map_or(0.0, |p| time_fmt::elapsed_seconds(p, record.timestamp));
        previous = Some(record.timestamp);
        tracing::info!(
            "[{}] +{:.3}s attitude={} position={}",
            time_fmt::format_time(record.timestamp),
            gap,
            record.has_attitude(),
            record.has_position()
        );
    });

    let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded();
    let running = Arc::new(AtomicBool::new(true));
    spawn_command_reader(cmd_tx, running.clone());

    let station = Runtime::new(station, SystemClock, cmd_rx, running)
        .on_outcome(report)
        .run();

    if let Some(log) = station.recorder().frozen_log() {
        tracing::info!("Last recording held {} records", log.len());
    }
    tracing::info!("Shutting down...");
    Ok(())
}
