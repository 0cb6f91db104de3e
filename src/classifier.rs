//! Cohort classification
//!
//! For every window and every author seen in that window or its two
//! predecessors, compares the author's post counts across the three windows:
//! - retained: posted, and exactly as much as the previous window
//! - new: posted, with nothing in either predecessor
//! - expanded: posted more than a non-zero previous window
//! - resurrected: posted after a silent previous window but active past window
//! - contracted: posted, but less than the previous window
//! - churned: silent now after activity before
//!
//! The churn rule also requires `past != prev`, so an author with
//! `cur == 0` and `prev == past != 0` carries no flag at all.

use crate::types::{CohortRecord, CohortTable, TimeWindow};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Classifier for turning ordered windows into cohort tables
pub struct CohortClassifier;

impl CohortClassifier {
    /// Classify every window against its two predecessors
    pub fn classify(windows: &[TimeWindow]) -> Vec<CohortTable> {
        let tables: Vec<CohortTable> = (0..windows.len())
            .map(|i| {
                let prev = i.checked_sub(1).map(|j| &windows[j]);
                let past = i.checked_sub(2).map(|j| &windows[j]);
                Self::classify_window(&windows[i], prev, past)
            })
            .collect();

        debug!(
            windows = tables.len(),
            records = tables.iter().map(|t| t.records.len()).sum::<usize>(),
            "classified cohorts"
        );
        tables
    }

    /// Classify one window; absent predecessors count as empty.
    ///
    /// Records are ordered by descending `cur`; ties keep the order in which
    /// authors first appear in current, then previous, then past items.
    pub fn classify_window(
        window: &TimeWindow,
        prev: Option<&TimeWindow>,
        past: Option<&TimeWindow>,
    ) -> CohortTable {
        let cur_counts = author_counts(Some(window));
        let prev_counts = author_counts(prev);
        let past_counts = author_counts(past);

        let mut seen = HashSet::new();
        let authors: Vec<&str> = [Some(window), prev, past]
            .into_iter()
            .flatten()
            .flat_map(|w| w.items.iter().map(|item| item.author.as_str()))
            .filter(|author| seen.insert(*author))
            .collect();

        let mut records: Vec<CohortRecord> = authors
            .into_iter()
            .map(|author| {
                let count = |counts: &HashMap<&str, u32>| counts.get(author).copied().unwrap_or(0);
                classify_counts(
                    author,
                    &window.label,
                    count(&cur_counts),
                    count(&prev_counts),
                    count(&past_counts),
                )
            })
            .collect();

        records.sort_by(|a, b| b.cur.cmp(&a.cur));

        CohortTable {
            label: window.label.clone(),
            records,
        }
    }
}

/// Build one author's record from their three counts
pub fn classify_counts(
    author: &str,
    window_label: &str,
    cur: u32,
    prev: u32,
    past: u32,
) -> CohortRecord {
    CohortRecord {
        author: author.to_string(),
        window_label: window_label.to_string(),
        cur,
        prev,
        past,
        is_retained: cur != 0 && cur == prev,
        is_new: cur != 0 && prev == 0 && past == 0,
        is_expanded: cur > prev && prev != 0,
        is_resurrected: cur != 0 && prev == 0 && past != 0,
        is_contracted: cur < prev && cur != 0,
        is_churned: (past != 0 || prev != 0) && cur == 0 && past != prev,
    }
}

fn author_counts(window: Option<&TimeWindow>) -> HashMap<&str, u32> {
    let mut counts = HashMap::new();
    if let Some(window) = window {
        for item in &window.items {
            *counts.entry(item.author.as_str()).or_insert(0) += 1;
        }
    }
    counts
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::{ChannelKind, ContentItem};
    use chrono::{Duration, TimeZone, Utc};

    /// Window whose items are `n` posts by each `(author, n)` pair
    pub(crate) fn make_window(label: &str, counts: &[(&str, u32)]) -> TimeWindow {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let items = counts
            .iter()
            .flat_map(|(author, n)| {
                (0..*n).map(move |k| ContentItem {
                    author: author.to_string(),
                    sent_at: start + Duration::minutes(k as i64),
                    channel: "chat/~zod/general".to_string(),
                    kind: ChannelKind::Conversation,
                })
            })
            .collect();
        TimeWindow {
            label: label.to_string(),
            start,
            end: start + Duration::weeks(1),
            items,
        }
    }

    /// Three windows reproducing `A=(5,0,0) B=(3,3,3) C=(0,4,0) D=(2,5,1)
    /// E=(4,0,2) F=(6,2,0)` as `(cur, prev, past)` in the last one
    pub(crate) fn scenario_windows() -> Vec<TimeWindow> {
        vec![
            make_window("past", &[("B", 3), ("D", 1), ("E", 2)]),
            make_window("prev", &[("B", 3), ("C", 4), ("D", 5), ("F", 2)]),
            make_window("cur", &[("A", 5), ("B", 3), ("D", 2), ("E", 4), ("F", 6)]),
        ]
    }

    fn flag_names(record: &CohortRecord) -> Vec<&'static str> {
        let mut names = Vec::new();
        if record.is_new {
            names.push("new");
        }
        if record.is_retained {
            names.push("retained");
        }
        if record.is_expanded {
            names.push("expanded");
        }
        if record.is_resurrected {
            names.push("resurrected");
        }
        if record.is_contracted {
            names.push("contracted");
        }
        if record.is_churned {
            names.push("churned");
        }
        names
    }

    #[test]
    fn test_scenario_flags() {
        let tables = CohortClassifier::classify(&scenario_windows());
        let table = &tables[2];
        assert_eq!(table.label, "cur");
        assert_eq!(table.records.len(), 6);

        let by_author: HashMap<&str, &CohortRecord> = table
            .records
            .iter()
            .map(|r| (r.author.as_str(), r))
            .collect();

        let expect = [
            ("A", (5, 0, 0), "new"),
            ("B", (3, 3, 3), "retained"),
            ("C", (0, 4, 0), "churned"),
            ("D", (2, 5, 1), "contracted"),
            ("E", (4, 0, 2), "resurrected"),
            ("F", (6, 2, 0), "expanded"),
        ];
        let windows = scenario_windows();
        for (author, (cur, prev, past), flag) in expect {
            let record = by_author[author];
            assert_eq!((record.cur, record.prev, record.past), (cur, prev, past));
            assert_eq!(
                (windows[2].count_by(author), windows[1].count_by(author), windows[0].count_by(author)),
                (cur, prev, past)
            );
            assert_eq!(flag_names(record), vec![flag], "author {}", author);
            assert_eq!(record.window_label, "cur");
        }
    }

    #[test]
    fn test_records_sorted_by_cur_desc_with_stable_ties() {
        let tables = CohortClassifier::classify(&scenario_windows());
        let order: Vec<&str> = tables[2].records.iter().map(|r| r.author.as_str()).collect();
        // C only appears through the previous window, so it sorts last
        assert_eq!(order, vec!["F", "A", "E", "B", "D", "C"]);

        let window = make_window("w", &[("~nec", 1), ("~zod", 1), ("~bus", 2)]);
        let table = CohortClassifier::classify_window(&window, None, None);
        let order: Vec<&str> = table.records.iter().map(|r| r.author.as_str()).collect();
        assert_eq!(order, vec!["~bus", "~nec", "~zod"]);
    }

    #[test]
    fn test_first_windows_treat_missing_predecessors_as_empty() {
        let tables = CohortClassifier::classify(&scenario_windows());

        assert!(tables[0].records.iter().all(|r| r.is_new && r.prev == 0 && r.past == 0));

        let d = tables[1].records.iter().find(|r| r.author == "D").unwrap();
        assert_eq!((d.cur, d.prev, d.past), (5, 1, 0));
        assert!(d.is_expanded);

        let e = tables[1].records.iter().find(|r| r.author == "E").unwrap();
        assert_eq!((e.cur, e.prev, e.past), (0, 2, 0));
        assert!(e.is_churned);
    }

    #[test]
    fn test_record_exists_only_for_authors_in_three_windows() {
        let windows = vec![
            make_window("w0", &[("~old", 1)]),
            make_window("w1", &[]),
            make_window("w2", &[]),
            make_window("w3", &[("~zod", 1)]),
        ];
        let tables = CohortClassifier::classify(&windows);

        let authors = |i: usize| -> Vec<&str> {
            tables[i].records.iter().map(|r| r.author.as_str()).collect()
        };
        assert_eq!(authors(2), vec!["~old"]);
        assert_eq!(authors(3), vec!["~zod"]);
    }

    #[test]
    fn test_flat_silence_is_not_churn() {
        // Known edge case: prev == past != 0 with cur == 0 carries no flag
        let record = classify_counts("~zod", "w", 0, 2, 2);
        assert!(flag_names(&record).is_empty());

        let record = classify_counts("~zod", "w", 0, 2, 3);
        assert_eq!(flag_names(&record), vec!["churned"]);
    }

    #[test]
    fn test_flag_exclusivity_exhaustive() {
        for cur in 0..5 {
            for prev in 0..5 {
                for past in 0..5 {
                    let r = classify_counts("x", "w", cur, prev, past);
                    let active = [
                        r.is_new,
                        r.is_retained,
                        r.is_expanded,
                        r.is_resurrected,
                        r.is_contracted,
                    ];

                    if r.is_churned {
                        assert_eq!(r.cur, 0);
                    }
                    if active.iter().any(|f| *f) {
                        assert_ne!(r.cur, 0);
                        assert!(!r.is_churned);
                    }
                    assert!(!(r.is_new && r.is_resurrected));

                    if prev != 0 && cur != 0 {
                        let partition = [r.is_retained, r.is_expanded, r.is_contracted];
                        assert_eq!(partition.iter().filter(|f| **f).count(), 1);
                    }
                    // Any active author gets exactly one flag
                    if cur != 0 {
                        assert_eq!(active.iter().filter(|f| **f).count(), 1);
                    }
                }
            }
        }
    }
}
