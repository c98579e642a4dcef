//! Log file encoding
//!
//! JSON is the persisted format: an array of `{timestamp, data: {lora?, rtk?}}`
//! entries that reloads into an identical [`Log`]. CSV is export-only and
//! lossy: an absent source is written as empty cells, which cannot be told
//! apart from a missing value on the way back.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

use crate::error::{GroundLinkError, Result};
use crate::types::{AttitudeSample, CombinedRecord, Log, PositionSample, Timestamp, Vector3};

use super::types::ExportFormat;

/// Column header of the CSV export
pub const CSV_HEADER: [&str; 25] = [
    "timestamp",
    "eulerCounter",
    "eulerX",
    "eulerY",
    "eulerZ",
    "velocityX",
    "velocityY",
    "velocityZ",
    "gravityX",
    "gravityY",
    "gravityZ",
    "angAccelX",
    "angAccelY",
    "angAccelZ",
    "linAccelX",
    "linAccelY",
    "linAccelZ",
    "freeHeapSize",
    "servoAngle",
    "rtkPosX",
    "rtkPosY",
    "rtkPosZ",
    "rtkOrientX",
    "rtkOrientY",
    "rtkOrientZ",
];

#[derive(Debug, Serialize, Deserialize)]
struct LogEntry {
    timestamp: Timestamp,
    data: EntryData,
}

#[derive(Debug, Serialize, Deserialize)]
struct EntryData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lora: Option<AttitudeSample>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rtk: Option<PositionSample>,
}

impl From<&CombinedRecord> for LogEntry {
    fn from(record: &CombinedRecord) -> Self {
        Self {
            timestamp: record.timestamp,
            data: EntryData {
                lora: record.attitude.clone(),
                rtk: record.position.clone(),
            },
        }
    }
}

/// Serialize a log in the requested format
pub fn encode(log: &Log, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => encode_json(log),
        ExportFormat::Csv => Ok(encode_csv(log)),
    }
}

/// Pretty-printed JSON array of log entries
pub fn encode_json(log: &Log) -> Result<String> {
    let entries: Vec<LogEntry> = log.iter().map(LogEntry::from).collect();
    serde_json::to_string_pretty(&entries)
        .map_err(|e| GroundLinkError::Export(format!("Failed to serialize log: {}", e)))
}

/// Header line plus one row per record, each line newline-terminated
pub fn encode_csv(log: &Log) -> String {
    let mut csv = CSV_HEADER.join(",");
    csv.push('\n');

    for record in log {
        let mut cells: Vec<String> = Vec::with_capacity(CSV_HEADER.len());
        cells.push(record.timestamp.to_string());

        match &record.attitude {
            Some(a) => {
                cells.push(a.euler_counter.to_string());
                for v in [
                    a.euler_angles,
                    a.velocity,
                    a.gravity,
                    a.angular_acceleration,
                    a.linear_acceleration,
                ] {
                    push_vector(&mut cells, &v);
                }
                cells.push(a.free_heap_size.to_string());
                cells.push(a.servo_motor_angle.to_string());
            }
            None => cells.extend(std::iter::repeat(String::new()).take(18)),
        }

        match &record.position {
            Some(p) => {
                push_vector(&mut cells, &p.position);
                push_vector(&mut cells, &p.orientation);
            }
            None => cells.extend(std::iter::repeat(String::new()).take(6)),
        }

        let _ = writeln!(csv, "{}", cells.join(","));
    }

    csv
}

fn push_vector(cells: &mut Vec<String>, v: &Vector3) {
    cells.extend(v.components().iter().map(f64::to_string));
}

/// Decode a JSON log, checking every entry carries data and time never runs backwards
pub fn decode_json(content: &str) -> Result<Log> {
    let entries: Vec<LogEntry> = serde_json::from_str(content)?;
    let mut records = Vec::with_capacity(entries.len());
    let mut previous: Option<Timestamp> = None;

    for (index, entry) in entries.into_iter().enumerate() {
        if previous.is_some_and(|p| entry.timestamp < p) {
            return Err(GroundLinkError::Parse(format!(
                "entry {} goes back in time ({} < {})",
                index,
                entry.timestamp,
                previous.unwrap_or_default()
            )));
        }
        previous = Some(entry.timestamp);

        let EntryData { lora, rtk } = entry.data;
        let mut record = CombinedRecord::fuse(lora, rtk).ok_or_else(|| {
            GroundLinkError::Parse(format!("entry {} has neither lora nor rtk data", index))
        })?;
        record.timestamp = entry.timestamp;
        records.push(record);
    }

    Ok(records.into())
}

/// Write a log to disk as JSON
pub fn save_log_file(path: &Path, log: &Log) -> Result<()> {
    let json = encode_json(log)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Read a JSON log from disk
pub fn read_log_file(path: &Path) -> Result<Log> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => GroundLinkError::NotFound(path.display().to_string()),
        _ => GroundLinkError::Io(e),
    })?;
    decode_json(&content).map_err(|e| match e {
        GroundLinkError::Parse(message) => {
            GroundLinkError::Parse(format!("{}: {}", path.display(), message))
        }
        other => other.with_context(format!("Failed to read {}", path.display())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_record(timestamp: Timestamp) -> CombinedRecord {
        let attitude = AttitudeSample {
            timestamp,
            euler_counter: 12,
            euler_angles: Vector3::new(1.0, 2.0, 3.0),
            velocity: Vector3::new(0.5, -0.5, 0.0),
            gravity: Vector3::new(0.0, 0.0, -9.81),
            angular_acceleration: Vector3::default(),
            linear_acceleration: Vector3::new(0.25, 0.0, 1.0),
            free_heap_size: 12_000,
            servo_motor_angle: 90.5,
        };
        let position = PositionSample {
            timestamp: timestamp - 5,
            position: Vector3::new(10.0, 20.0, 30.0),
            orientation: Vector3::new(0.0, 1.5, 359.0),
        };
        CombinedRecord::fuse(Some(attitude), Some(position)).unwrap()
    }

    fn attitude_only(timestamp: Timestamp) -> CombinedRecord {
        CombinedRecord::fuse(
            Some(AttitudeSample::with_euler(timestamp, Vector3::new(1.0, 2.0, 3.0))),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_json_round_trip() {
        let log: Log = vec![attitude_only(1000), full_record(1200), full_record(1300)].into();
        let json = encode_json(&log).unwrap();
        let reloaded = decode_json(&json).unwrap();
        assert_eq!(reloaded, log);
    }

    #[test]
    fn test_json_entry_shape() {
        let log: Log = vec![attitude_only(1000)].into();
        let value: serde_json::Value = serde_json::from_str(&encode_json(&log).unwrap()).unwrap();
        assert_eq!(value[0]["timestamp"], 1000);
        assert_eq!(value[0]["data"]["lora"]["eulerAngles"]["y"], 2.0);
        assert!(value[0]["data"].get("rtk").is_none());
    }

    #[test]
    fn test_csv_layout() {
        let log: Log = vec![full_record(1200)].into();
        let csv = encode_csv(&log);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].split(',').count(), 25);
        assert_eq!(
            lines[1],
            "1200,12,1,2,3,0.5,-0.5,0,0,0,-9.81,0,0,0,0.25,0,1,12000,90.5,10,20,30,0,1.5,359"
        );
    }

    #[test]
    fn test_csv_is_lossy_for_absent_sources() {
        let log: Log = vec![attitude_only(1000)].into();
        let csv = encode_csv(&log);
        let row: Vec<&str> = csv.lines().nth(1).unwrap().split(',').collect();
        assert_eq!(row.len(), 25);
        // Position columns carry no data at all, not zeros
        assert!(row[19..].iter().all(|cell| cell.is_empty()));
        assert_eq!(row[2], "1");
    }

    #[test]
    fn test_empty_log_exports_header_only() {
        assert_eq!(encode_csv(&Log::empty()).lines().count(), 1);
        assert_eq!(decode_json(&encode_json(&Log::empty()).unwrap()).unwrap().len(), 0);
    }

    #[test]
    fn test_decode_rejects_malformed_content() {
        assert!(matches!(decode_json("{not json"), Err(GroundLinkError::Parse(_))));
        assert!(matches!(
            decode_json(r#"[{"timestamp": 1, "data": {}}]"#),
            Err(GroundLinkError::Parse(_))
        ));
    }

    #[test]
    fn test_decode_rejects_time_going_backwards() {
        let content = r#"[
            {"timestamp": 2000, "data": {"rtk": {"timestamp": 2000,
                "position": {"x": 0, "y": 0, "z": 0}, "orientation": {"x": 0, "y": 0, "z": 0}}}},
            {"timestamp": 1000, "data": {"rtk": {"timestamp": 1000,
                "position": {"x": 0, "y": 0, "z": 0}, "orientation": {"x": 0, "y": 0, "z": 0}}}}
        ]"#;
        let err = decode_json(content).unwrap_err();
        assert!(err.to_string().contains("goes back in time"));
    }

    #[test]
    fn test_read_missing_file_is_not_found() {
        let err = read_log_file(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, GroundLinkError::NotFound(_)));
    }

    #[test]
    fn test_read_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("truncated.json");
        std::fs::write(&path, "[{\"timestamp\": 1, \"data\": ").unwrap();

        match read_log_file(&path).unwrap_err() {
            GroundLinkError::Parse(message) => assert!(message.contains("truncated.json")),
            other => panic!("expected a parse error, got {:?}", other),
        }
    }
}
