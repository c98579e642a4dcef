//! Operator commands
//!
//! Commands arrive as text lines (one per command) and are parsed into
//! [`ControlCommand`]. [`execute`] applies one to a [`GroundStation`].
//!
//! ```text
//! live | playback | mode
//! record start | record stop
//! load <identifier> | replay
//! play | pause | seek <index> | speed <multiplier> | faster | slower
//! export json|csv [path]
//! connect attitude|position <endpoint> | disconnect attitude|position
//! status | quit
//! ```

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{GroundLinkError, Result};
use crate::mode::Mode;
use crate::session::ExportFormat;
use crate::station::{GroundStation, StationStatus};
use crate::types::SourceKind;

/// A parsed operator command
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    /// Switch to a mode
    SetMode(Mode),
    /// Flip between live and playback
    ToggleMode,
    StartRecording,
    StopRecording,
    /// Load a log by identifier or path
    Load(String),
    /// Load the last finished recording
    LoadRecorded,
    Play,
    Pause,
    Seek(i64),
    Speed(f64),
    /// Step to the next configured speed preset up or down
    StepSpeed { faster: bool },
    /// Export the current log; to stdout when no path is given
    Export {
        format: ExportFormat,
        path: Option<PathBuf>,
    },
    Connect {
        source: SourceKind,
        endpoint: String,
    },
    Disconnect(SourceKind),
    Status,
    Quit,
}

/// What a command produced
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Done,
    /// Export content destined for the operator
    Exported(String),
    /// Export written to a file
    Written(PathBuf),
    Loaded(usize),
    /// Playback speed after a step
    Speed(f64),
    Status(StationStatus),
    Quit,
}

fn parse_source(word: Option<&str>) -> Result<SourceKind> {
    match word.map(str::to_ascii_lowercase).as_deref() {
        Some("attitude") | Some("lora") => Ok(SourceKind::Attitude),
        Some("position") | Some("rtk") => Ok(SourceKind::Position),
        Some(other) => Err(GroundLinkError::Parse(format!("Unknown source: {}", other))),
        None => Err(GroundLinkError::Parse("Missing source name".to_string())),
    }
}

fn required<'a>(word: Option<&'a str>, what: &str) -> Result<&'a str> {
    word.ok_or_else(|| GroundLinkError::Parse(format!("Missing {}", what)))
}

impl FromStr for ControlCommand {
    type Err = GroundLinkError;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(GroundLinkError::Parse("Empty command".to_string()));
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "live" => ControlCommand::SetMode(Mode::Live),
            "playback" => ControlCommand::SetMode(Mode::Playback),
            "mode" | "toggle" => ControlCommand::ToggleMode,
            "record" | "rec" => match required(words.next(), "start|stop")? {
                "start" => ControlCommand::StartRecording,
                "stop" => ControlCommand::StopRecording,
                other => {
                    return Err(GroundLinkError::Parse(format!(
                        "Expected start or stop, got {}",
                        other
                    )))
                }
            },
            "load" => ControlCommand::Load(required(words.next(), "log identifier")?.to_string()),
            "replay" => ControlCommand::LoadRecorded,
            "play" => ControlCommand::Play,
            "pause" => ControlCommand::Pause,
            "seek" => {
                let index = required(words.next(), "index")?;
                ControlCommand::Seek(index.parse().map_err(|_| {
                    GroundLinkError::Parse(format!("Invalid index: {}", index))
                })?)
            }
            "speed" => {
                let speed = required(words.next(), "speed")?;
                ControlCommand::Speed(speed.trim_end_matches('x').parse().map_err(|_| {
                    GroundLinkError::Parse(format!("Invalid speed: {}", speed))
                })?)
            }
            "faster" => ControlCommand::StepSpeed { faster: true },
            "slower" => ControlCommand::StepSpeed { faster: false },
            "export" => ControlCommand::Export {
                format: required(words.next(), "format")?.parse()?,
                path: words.next().map(PathBuf::from),
            },
            "connect" => ControlCommand::Connect {
                source: parse_source(words.next())?,
                endpoint: required(words.next(), "endpoint")?.to_string(),
            },
            "disconnect" => ControlCommand::Disconnect(parse_source(words.next())?),
            "status" => ControlCommand::Status,
            "quit" | "exit" | "q" => ControlCommand::Quit,
            other => return Err(GroundLinkError::Parse(format!("Unknown command: {}", other))),
        };
        Ok(command)
    }
}

/// Apply `command` to the station
pub fn execute(station: &mut GroundStation, command: ControlCommand) -> Result<CommandOutcome> {
    tracing::debug!("Executing {:?}", command);
    let outcome = match command {
        ControlCommand::SetMode(mode) => {
            station.set_mode(mode);
            CommandOutcome::Done
        }
        ControlCommand::ToggleMode => {
            station.toggle_mode();
            CommandOutcome::Done
        }
        ControlCommand::StartRecording => {
            station.start_logging();
            CommandOutcome::Done
        }
        ControlCommand::StopRecording => {
            if let Some(log) = station.stop_logging() {
                tracing::info!("Recording stopped with {} records", log.len());
            }
            CommandOutcome::Done
        }
        ControlCommand::Load(identifier) => CommandOutcome::Loaded(station.load_log(&identifier)?),
        ControlCommand::LoadRecorded => CommandOutcome::Loaded(station.load_recorded()?),
        ControlCommand::Play => {
            station.play();
            CommandOutcome::Done
        }
        ControlCommand::Pause => {
            station.pause();
            CommandOutcome::Done
        }
        ControlCommand::Seek(index) => {
            station.seek(index);
            CommandOutcome::Done
        }
        ControlCommand::Speed(multiplier) => {
            if !station.set_speed(multiplier) {
                return Err(GroundLinkError::InvalidState(format!(
                    "Speed must be a positive number, got {}",
                    multiplier
                )));
            }
            CommandOutcome::Done
        }
        ControlCommand::StepSpeed { faster } => CommandOutcome::Speed(station.step_speed(faster)),
        ControlCommand::Export { format, path: None } => {
            CommandOutcome::Exported(station.export_log(format)?)
        }
        ControlCommand::Export {
            format,
            path: Some(path),
        } => {
            station.recorder().export_to_file(format, &path)?;
            CommandOutcome::Written(path)
        }
        ControlCommand::Connect { source, endpoint } => {
            station.connect(source, &endpoint)?;
            CommandOutcome::Done
        }
        ControlCommand::Disconnect(source) => {
            station.disconnect(source)?;
            CommandOutcome::Done
        }
        ControlCommand::Status => CommandOutcome::Status(station.status()),
        ControlCommand::Quit => CommandOutcome::Quit,
    };
    Ok(outcome)
}
