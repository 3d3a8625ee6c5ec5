//! Append-only daily attendance log.
//!
//! One CSV file per calendar date, columns `Name,ID,Status,Timestamp`. The
//! header is written only when the file is created; every run afterwards
//! appends a full roster of rows. Runs are not deduplicated by day: marking
//! attendance twice on the same date appends two rosters. Collapsing to a
//! last-status-per-day view is left to whatever consumes the log.

use std::collections::BTreeSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate};

use crate::store::EncodingStore;

const HEADER: &str = "Name,ID,Status,Timestamp";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Log file for a given date: `attendance_<YYYY-MM-DD>.csv`.
pub fn daily_log_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("attendance_{}.csv", date.format("%Y-%m-%d")))
}

/// Append one Present/Absent row per enrolled identity to the dated log,
/// sharing a single timestamp. Returns the path written to.
///
/// An identity is Present iff its id is in `present`. Duplicate ids in the
/// store produce a single row (first enrollment wins). Prior rows are never
/// rewritten.
pub fn record(
    dir: &Path,
    store: &EncodingStore,
    present: &BTreeSet<String>,
    now: DateTime<Local>,
) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = daily_log_path(dir, now.date_naive());
    let existed = path.exists();

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening {}", path.display()))?;

    if !existed {
        writeln!(file, "{HEADER}")?;
    }

    let timestamp = now.format(TIMESTAMP_FORMAT);
    let mut seen = BTreeSet::new();
    for entry in &store.entries {
        let identity = &entry.identity;
        if !seen.insert(identity.id.as_str()) {
            continue;
        }
        let status = if present.contains(&identity.id) {
            "Present"
        } else {
            "Absent"
        };
        writeln!(file, "{},{},{},{}", identity.name, identity.id, status, timestamp)?;
    }

    Ok(path)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::store::Identity;

    fn store_of(people: &[(&str, &str)]) -> EncodingStore {
        let mut store = EncodingStore::default();
        for (name, id) in people {
            store.push(
                Identity {
                    name: name.to_string(),
                    id: id.to_string(),
                },
                vec![0.0],
            );
        }
        store
    }

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 8, 23, h, m, 0).unwrap()
    }

    fn ids(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn writes_header_and_full_roster() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_of(&[("alice", "1"), ("bob", "2")]);

        let path = record(dir.path(), &store, &ids(&["1"]), at(9, 0)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Name,ID,Status,Timestamp");
        assert_eq!(lines[1], "alice,1,Present,2026-08-23 09:00:00");
        assert_eq!(lines[2], "bob,2,Absent,2026-08-23 09:00:00");
    }

    #[test]
    fn second_run_appends_without_header() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_of(&[("alice", "1")]);

        record(dir.path(), &store, &ids(&[]), at(9, 0)).unwrap();
        let path = record(dir.path(), &store, &ids(&["1"]), at(10, 30)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "alice,1,Absent,2026-08-23 09:00:00");
        assert_eq!(lines[2], "alice,1,Present,2026-08-23 10:30:00");
    }

    #[test]
    fn exactly_one_row_per_identity() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_of(&[("alice", "1"), ("bob", "2"), ("carol", "3")]);

        // Present set may only ever be a subset of the roster.
        let path = record(dir.path(), &store, &ids(&["2", "3"]), at(8, 15)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let rows: Vec<&str> = content.lines().skip(1).collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].contains("Absent"));
        assert!(rows[1].contains("Present"));
        assert!(rows[2].contains("Present"));
    }

    #[test]
    fn duplicate_ids_emit_a_single_row() {
        let dir = tempfile::tempdir().unwrap();
        // Same id enrolled twice (e.g. two photos of the same student).
        let store = store_of(&[("alice", "1"), ("alice2", "1")]);

        let path = record(dir.path(), &store, &ids(&["1"]), at(9, 0)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let rows: Vec<&str> = content.lines().skip(1).collect();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].starts_with("alice,1,Present"));
    }

    #[test]
    fn log_filename_carries_the_date() {
        let path = daily_log_path(Path::new("daily_attendance"), at(9, 0).date_naive());
        assert_eq!(
            path,
            Path::new("daily_attendance").join("attendance_2026-08-23.csv")
        );
    }
}
