use crate::prelude::{CoreError, CoreResult};
use crate::survey::Waypoint;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Serialize)]
struct CsvRow {
    #[serde(rename = "RecordNumber")]
    record_number: u64,
    #[serde(rename = "Distance")]
    distance: f64,
    #[serde(rename = "Heading")]
    heading: f64,
    #[serde(rename = "Depth")]
    depth: f64,
    #[serde(rename = "Type")]
    kind: &'static str,
}

impl From<&Waypoint> for CsvRow {
    fn from(waypoint: &Waypoint) -> Self {
        Self {
            record_number: waypoint.sequence_number,
            distance: waypoint.distance,
            heading: waypoint.heading,
            depth: waypoint.depth,
            kind: waypoint.source_kind.as_str(),
        }
    }
}

/// Writes the log as a header row plus one row per waypoint.
pub fn write_csv<W: Write>(writer: W, waypoints: &[Waypoint]) -> CoreResult<()> {
    if waypoints.is_empty() {
        return Err(CoreError::EmptyExport("waypoint log is empty".into()));
    }

    let mut writer = csv::Writer::from_writer(writer);
    for waypoint in waypoints {
        writer.serialize(CsvRow::from(waypoint))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn export_csv<P: AsRef<Path>>(path: P, waypoints: &[Waypoint]) -> CoreResult<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path.as_ref())?;
    write_csv(file, waypoints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::{SourceKind, WaypointLog};

    fn sample_log() -> WaypointLog {
        let mut log = WaypointLog::new();
        log.append(0.12, 91.5, 0.0, SourceKind::Auto);
        log.append(0.0, 91.5, -6.0, SourceKind::Manual);
        log
    }

    #[test]
    fn csv_has_header_and_one_row_per_waypoint() {
        let mut buffer = Vec::new();
        write_csv(&mut buffer, sample_log().entries()).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "RecordNumber,Distance,Heading,Depth,Type");
        assert!(lines[1].ends_with(",auto"));
        assert!(lines[2].ends_with(",manual"));
    }

    #[test]
    fn csv_rows_parse_back_to_values() {
        let mut buffer = Vec::new();
        write_csv(&mut buffer, sample_log().entries()).unwrap();
        let mut reader = csv::Reader::from_reader(buffer.as_slice());
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(&rows[1][0], "1");
        assert_eq!(rows[1][3].parse::<f64>().unwrap(), -6.0);
        assert_eq!(rows[0][1].parse::<f64>().unwrap(), 0.12);
    }

    #[test]
    fn empty_log_is_not_exported() {
        let mut buffer = Vec::new();
        assert!(matches!(
            write_csv(&mut buffer, &[]),
            Err(CoreError::EmptyExport(_))
        ));
        assert!(buffer.is_empty());
    }

    #[test]
    fn export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("SavedData.csv");
        export_csv(&path, sample_log().entries()).unwrap();
        let contents = std::fs::read_to_string(path).unwrap();
        assert!(contents.starts_with("RecordNumber,"));
    }
}
