//! Document export: the whole log as one JSON file

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{Event, TrialResult};
use crate::Result;

/// Snapshot of both logs plus the export time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    results: Vec<TrialResult>,
    events: Vec<Event>,
    exported_at: String,
}

impl ExportDocument {
    /// Exported results, in log order.
    #[must_use]
    pub fn results(&self) -> &[TrialResult] {
        &self.results
    }

    /// Exported events, in log order.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// ISO-8601 export time.
    #[must_use]
    pub fn exported_at(&self) -> &str {
        &self.exported_at
    }

    /// Pretty-printed JSON (two-space indent).
    ///
    /// # Errors
    /// Returns error if a record cannot be serialized
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a previously exported document.
    ///
    /// # Errors
    /// Returns error if `json` is not an export document
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Build an export document. Deterministic for a fixed `exported_at`.
#[must_use]
pub fn to_document(
    results: &[TrialResult],
    events: &[Event],
    exported_at: DateTime<Utc>,
) -> ExportDocument {
    ExportDocument {
        results: results.to_vec(),
        events: events.to_vec(),
        exported_at: exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

/// `hci_study_data_<epoch-ms>.json`
#[must_use]
pub fn document_filename(at: DateTime<Utc>) -> String {
    format!("hci_study_data_{}.json", at.timestamp_millis())
}

/// Write `document` into `dir` and return the file path.
///
/// # Errors
/// Returns error if serialization or the write fails
pub fn save_document<P: AsRef<Path>>(
    dir: P,
    document: &ExportDocument,
    at: DateTime<Utc>,
) -> Result<PathBuf> {
    let path = dir.as_ref().join(document_filename(at));
    fs::write(&path, document.to_json_pretty()?)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::UiVersion;
    use chrono::TimeZone;
    use serde_json::{json, Map};

    fn at() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
    }

    #[test]
    fn test_document_shape() {
        let results = vec![TrialResult::new("p1", UiVersion::A)];
        let events = vec![Event::stamped("start", Map::new(), at())];

        let doc = to_document(&results, &events, at());
        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(
            value,
            json!({
                "results": [{"participantId": "p1", "uiVersion": "A"}],
                "events": [{
                    "event": "start",
                    "data": {},
                    "timestamp": 1_700_000_000_000_i64,
                    "datetime": "2023-11-14T22:13:20.000Z"
                }],
                "exportedAt": "2023-11-14T22:13:20.000Z"
            })
        );
    }

    #[test]
    fn test_document_is_deterministic_for_fixed_time() {
        let results = vec![TrialResult::new("p1", UiVersion::B)];
        let a = to_document(&results, &[], at()).to_json_pretty().unwrap();
        let b = to_document(&results, &[], at()).to_json_pretty().unwrap();
        assert_eq!(a, b);
        assert!(a.contains("\n  \"results\""));
    }

    #[test]
    fn test_filename_pattern() {
        assert_eq!(document_filename(at()), "hci_study_data_1700000000000.json");
    }
}
