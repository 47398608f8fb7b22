//! JSON export of the reading history.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::data::{overall, Reading, Status, Store, WindowStats};

/// Everything written by [`write_export`].
#[derive(Debug, Serialize)]
pub struct Export<'a> {
    pub exported_at: DateTime<Utc>,
    pub summary: ExportSummary,
    /// Full bounded history, oldest first.
    pub readings: Vec<&'a Reading>,
}

#[derive(Debug, Serialize)]
pub struct ExportSummary {
    pub rows: usize,
    pub capacity: usize,
    /// Overall status of the latest reading; `None` for an empty history.
    pub overall: Option<Status>,
    pub latest_room: Option<String>,
    /// Flat `<metric>_avg` / `<metric>_max` statistics over the whole history.
    pub stats: serde_json::Value,
}

impl<'a> Export<'a> {
    pub fn from_store(store: &'a Store, exported_at: DateTime<Utc>) -> Self {
        let latest = store.latest();
        let stats = WindowStats::from_readings(store.iter());

        Self {
            exported_at,
            summary: ExportSummary {
                rows: store.len(),
                capacity: store.capacity(),
                overall: latest.map(|r| overall(&r.metrics)),
                latest_room: latest.map(|r| r.room.clone()),
                stats: stats.to_summary_json(),
            },
            readings: store.iter().collect(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Write the store's history to `path` as pretty JSON.
///
/// Returns the number of readings written.
pub fn write_export(path: &Path, store: &Store) -> Result<usize> {
    let export = Export::from_store(store, Utc::now());
    let json = export.to_json()?;

    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(json.as_bytes())?;

    tracing::info!(path = %path.display(), rows = store.len(), "exported history");
    Ok(store.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Metrics;
    use chrono::TimeZone;

    fn store() -> Store {
        let mut store = Store::with_capacity(2);
        for (i, co2) in [600.0, 1100.0, 1300.0].into_iter().enumerate() {
            let ts = Utc.timestamp_opt(1_700_000_000 + i as i64, 0).unwrap();
            store.append(Reading::new(ts, "Lab", Metrics::new(co2, 23.0, 50.0, 8.0)));
        }
        store
    }

    #[test]
    fn export_covers_bounded_history() {
        let store = store();
        let export = Export::from_store(&store, Utc::now());
        assert_eq!(export.readings.len(), 2);
        assert_eq!(export.summary.rows, 2);
        assert_eq!(export.summary.capacity, 2);
        // co2 1300 is bad, everything else good
        assert_eq!(export.summary.overall, Some(Status::Warn));
        assert_eq!(export.summary.stats["co2_max"], 1300.0);
    }

    #[test]
    fn empty_store_exports_without_status() {
        let store = Store::new();
        let json: serde_json::Value =
            serde_json::from_str(&Export::from_store(&store, Utc::now()).to_json().unwrap())
                .unwrap();
        assert_eq!(json["summary"]["rows"], 0);
        assert!(json["summary"]["overall"].is_null());
        assert_eq!(json["readings"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn writes_pretty_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");

        let rows = write_export(&path, &store()).unwrap();
        assert_eq!(rows, 2);

        let content = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(json["summary"]["overall"], "warn");
        assert_eq!(json["readings"][0]["co2"], 1100.0);
        assert_eq!(json["readings"][1]["room"], "Lab");
        assert!(content.contains('\n'));
    }

    #[test]
    fn unwritable_path_is_an_error() {
        assert!(write_export(Path::new("/nonexistent/dir/export.json"), &store()).is_err());
    }
}
