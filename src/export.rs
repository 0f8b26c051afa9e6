//! Attendance export -- merge the log with the live roster and render CSV.

use std::borrow::Cow;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::info;

use crate::attendance::AttendanceRecord;
use crate::roster::RosterEntry;

pub const HEADER: [&str; 6] = [
    "Meeting ID",
    "Name",
    "Roll Number",
    "Join Time",
    "Status",
    "Verification",
];

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One line of the export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub meeting_id: String,
    pub name: String,
    pub roll: String,
    pub join_time: DateTime<Utc>,
    pub verified: bool,
}

/// Verified records in append order, then every roster entry without a
/// record, marked unverified and stamped with the meeting start.
pub fn build_rows(
    records: &[AttendanceRecord],
    roster: &[RosterEntry],
    meeting_id: &str,
    started_at: DateTime<Utc>,
) -> Vec<ExportRow> {
    let recorded: HashSet<&str> = records.iter().map(|r| r.name.as_str()).collect();
    let mut seen: HashSet<&str> = HashSet::new();

    let verified = records.iter().map(|r| ExportRow {
        meeting_id: meeting_id.to_string(),
        name: r.name.clone(),
        roll: r.roll.clone(),
        join_time: r.timestamp,
        verified: r.verified,
    });

    let unverified = roster
        .iter()
        .filter(|p| !recorded.contains(p.name.as_str()) && seen.insert(p.name.as_str()))
        .map(|p| ExportRow {
            meeting_id: meeting_id.to_string(),
            name: p.name.clone(),
            roll: p.roll.clone(),
            join_time: started_at,
            verified: false,
        });

    verified.chain(unverified).collect()
}

/// Render rows as comma-separated text with a header line.
pub fn render_csv(rows: &[ExportRow]) -> String {
    let mut out = HEADER.join(",");
    out.push('\n');
    for row in rows {
        let time = row.join_time.format(TIME_FORMAT).to_string();
        let fields = [
            csv_field(&row.meeting_id),
            csv_field(&row.name),
            csv_field(&row.roll),
            Cow::Owned(time),
            Cow::Borrowed("Present"),
            Cow::Borrowed(if row.verified { "Verified" } else { "Not Verified" }),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// `attendance_<meetingId>_<YYYY-MM-DD>.csv`
pub fn export_filename(meeting_id: &str, date: NaiveDate) -> String {
    format!("attendance_{}_{}.csv", meeting_id, date.format("%Y-%m-%d"))
}

/// Write `csv` into `dir` under the standard export filename.
pub fn write_export(dir: &Path, meeting_id: &str, date: NaiveDate, csv: &str) -> Result<PathBuf> {
    let path = dir.join(export_filename(meeting_id, date));
    std::fs::write(&path, csv)
        .with_context(|| format!("failed to write export: {}", path.display()))?;
    info!(path = %path.display(), "exported attendance CSV");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_no_records_two_roster_entries() {
        let roster = vec![
            RosterEntry::new("Alice", "ST001"),
            RosterEntry::new("Bob", "ST002"),
        ];
        let rows = build_rows(&[], &roster, "ABC123", start());
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| !r.verified && r.join_time == start()));

        let csv = render_csv(&rows);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Meeting ID,Name,Roll Number,Join Time,Status,Verification");
        assert_eq!(lines[1], "ABC123,Alice,ST001,2024-05-06 09:00:00,Present,Not Verified");
        assert_eq!(lines[2], "ABC123,Bob,ST002,2024-05-06 09:00:00,Present,Not Verified");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_verified_roster_entry_not_repeated() {
        let at = Utc.with_ymd_and_hms(2024, 5, 6, 9, 12, 30).unwrap();
        let records = vec![AttendanceRecord::verified("Alice", "ST001", at)];
        let roster = vec![
            RosterEntry::new("Host", "HOST001"),
            RosterEntry::new("Alice", "ST001"),
            RosterEntry::new("Bob", "ST002"),
            RosterEntry::new("Bob", "ST002"),
        ];
        let rows = build_rows(&records, &roster, "M1", start());

        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Host", "Bob"]);
        assert!(rows[0].verified);
        assert_eq!(rows[0].join_time, at);

        let csv = render_csv(&rows);
        assert!(csv.contains("M1,Alice,ST001,2024-05-06 09:12:30,Present,Verified"));
    }

    #[test]
    fn test_departed_participant_keeps_record() {
        let records = vec![AttendanceRecord::verified("Carol", "ST003", start())];
        let rows = build_rows(&records, &[RosterEntry::new("Alice", "ST001")], "M1", start());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Carol");
    }

    #[test]
    fn test_fields_with_commas_are_quoted() {
        let rows = build_rows(&[], &[RosterEntry::new("Smith, \"J\"", "ST004")], "M1", start());
        let csv = render_csv(&rows);
        assert!(csv.contains("M1,\"Smith, \"\"J\"\"\",ST004,"));
    }

    #[test]
    fn test_filename_pattern() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        assert_eq!(export_filename("ABC123", date), "attendance_ABC123_2024-05-06.csv");
    }

    #[test]
    fn test_write_export() {
        let dir = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        let path = write_export(dir.path(), "ABC123", date, "x\n").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "x\n");
    }
}
