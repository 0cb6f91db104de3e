//! Flat export
//!
//! Flattens cohort tables into one row per (window, author) for tabular
//! download. Supports CSV and JSON. Normalized content items can be dumped
//! through the same CSV writer.

use crate::error::ComputeError;
use crate::types::{CohortRecord, CohortTable};
use csv::WriterBuilder;
use serde::Serialize;
use std::io::Write;
use tracing::debug;

/// All records of all tables, window order first, then leaderboard order
pub fn flatten(tables: &[CohortTable]) -> Vec<CohortRecord> {
    tables
        .iter()
        .flat_map(|table| table.records.iter().cloned())
        .collect()
}

/// Write rows as CSV with a header row taken from the field names
pub fn write_csv<T: Serialize, W: Write>(rows: &[T], writer: W) -> Result<(), ComputeError> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(writer);

    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .flush()
        .map_err(|e| ComputeError::EncodingError(e.to_string()))?;

    debug!(rows = rows.len(), "wrote CSV export");
    Ok(())
}

/// Rows as a CSV string
pub fn to_csv_string<T: Serialize>(rows: &[T]) -> Result<String, ComputeError> {
    let mut buffer = Vec::new();
    write_csv(rows, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| ComputeError::EncodingError(e.to_string()))
}

/// Records as a JSON array
pub fn to_json(records: &[CohortRecord]) -> Result<String, ComputeError> {
    serde_json::to_string_pretty(records).map_err(ComputeError::JsonError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::tests::scenario_windows;
    use crate::classifier::CohortClassifier;
    use crate::normalizer::ContentNormalizer;
    use crate::snapshot::{ChannelState, ContentSnapshot};
    use serde_json::json;

    #[test]
    fn test_flatten_keeps_window_order() {
        let tables = CohortClassifier::classify(&scenario_windows());
        let rows = flatten(&tables);

        let expected: usize = tables.iter().map(|t| t.records.len()).sum();
        assert_eq!(rows.len(), expected);
        assert_eq!(rows.first().unwrap().window_label, "past");
        assert_eq!(rows.last().unwrap().window_label, "cur");
    }

    #[test]
    fn test_csv_header_and_rows() {
        let tables = CohortClassifier::classify(&scenario_windows());
        let csv = to_csv_string(&tables[2].records).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "author,window_label,cur,prev,past,is_new,is_retained,is_expanded,is_resurrected,is_contracted,is_churned"
        );
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[1], "F,cur,6,2,0,false,false,true,false,false,false");
    }

    #[test]
    fn test_csv_quotes_awkward_authors() {
        let tables = vec![CohortTable {
            label: "30".to_string(),
            records: vec![crate::classifier::classify_counts("a,b", "30", 1, 0, 0)],
        }];
        let csv = to_csv_string(&flatten(&tables)).unwrap();
        assert!(csv.lines().nth(1).unwrap().starts_with("\"a,b\",30,1"));
    }

    #[test]
    fn test_json_export() {
        let tables = CohortClassifier::classify(&scenario_windows());
        let json = to_json(&tables[2].records).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value.as_array().unwrap().len(), 6);
        assert_eq!(value[0]["author"], "F");
        assert_eq!(value[0]["is_expanded"], true);
    }

    #[test]
    fn test_content_item_dump() {
        let snapshot = ContentSnapshot::new().with_channel(
            "chat/~zod/general",
            ChannelState::Resolved(json!([
                { "memo": { "author": "~zod", "sent": 1700000 } },
                { "memo": { "author": "~nec" } }
            ])),
        );
        let items = ContentNormalizer::normalize(&snapshot);
        let csv = to_csv_string(&items).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "author,sent_at,channel,kind");
        assert_eq!(lines[1], "~zod,2023-11-14T22:13:20Z,chat/~zod/general,conversation");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_empty_export_has_no_rows() {
        let csv = to_csv_string::<CohortRecord>(&[]).unwrap();
        assert!(csv.is_empty());
    }
}
