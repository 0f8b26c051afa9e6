//! Append-only attendance log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One successful verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub name: String,
    pub roll: String,
    pub timestamp: DateTime<Utc>,
    pub verified: bool,
}

impl AttendanceRecord {
    pub fn verified(name: impl Into<String>, roll: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            roll: roll.into(),
            timestamp: at,
            verified: true,
        }
    }
}

/// Records in append order. Nothing is ever edited or removed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttendanceLog {
    records: Vec<AttendanceRecord>,
}

impl AttendanceLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: AttendanceRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[AttendanceRecord] {
        &self.records
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.records.iter().any(|r| r.name == name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_serialized_as_plain_array() {
        let mut log = AttendanceLog::new();
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        log.append(AttendanceRecord::verified("Alice", "ST001", at));
        let json = log.to_json().unwrap();
        assert!(json.starts_with('['));
        assert!(json.contains("\"timestamp\":\"2024-03-01T09:30:00Z\""));
        assert!(json.contains("\"verified\":true"));
    }

    #[test]
    fn test_append_keeps_order_and_duplicates() {
        let at = Utc::now();
        let mut log = AttendanceLog::new();
        log.append(AttendanceRecord::verified("Bob", "ST002", at));
        log.append(AttendanceRecord::verified("Alice", "ST001", at));
        log.append(AttendanceRecord::verified("Bob", "ST002", at));
        let names: Vec<&str> = log.records().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Bob", "Alice", "Bob"]);
        assert!(log.contains_name("Alice"));
    }
}
