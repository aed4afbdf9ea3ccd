//! Property-based tests for study-tracker
//!
//! - Test log ordering and clearing invariants
//! - Test table export against an independent CSV parser
//! - Test summary counting invariants
//! - Run with ProptestConfig::with_cases(100)

use proptest::prelude::*;
use study_tracker::export::{escape_cell, summarize, to_table};
use study_tracker::local::{LocalLog, MemoryLocalStore};
use study_tracker::record::{TrialResult, UiVersion};

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

fn arb_ui_version() -> impl Strategy<Value = UiVersion> {
    prop_oneof![
        4 => Just(UiVersion::A),
        4 => Just(UiVersion::B),
        1 => "[a-z]{0,3}".prop_map(UiVersion::from),
    ]
}

/// Free text that exercises every quoting trigger
fn arb_cell_text() -> impl Strategy<Value = String> {
    "[a-z ,\"\n]{0,12}"
}

fn arb_result() -> impl Strategy<Value = TrialResult> {
    (
        "[a-z0-9]{1,8}",
        arb_ui_version(),
        arb_cell_text(),
        proptest::option::of((0u32..=600).prop_map(f64::from)),
        proptest::option::of((0u32..=100).prop_map(f64::from)),
        proptest::option::of(0u32..50),
    )
        .prop_map(|(pid, version, topic, time, scroll, clicks)| {
            let mut builder = TrialResult::builder(pid, version).article("art", topic);
            if let Some(time) = time {
                builder = builder.reading_time_sec(time);
            }
            if let Some(scroll) = scroll {
                builder = builder.max_scroll_depth(scroll);
            }
            if let Some(clicks) = clicks {
                builder = builder.distraction_clicks(clicks);
            }
            builder.build()
        })
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: the log returns results in recording order
    #[test]
    fn prop_log_preserves_order(results in proptest::collection::vec(arb_result(), 0..20)) {
        let log = LocalLog::new(MemoryLocalStore::new());
        for (i, result) in results.iter().enumerate() {
            prop_assert_eq!(log.append_result(result).unwrap(), i + 1);
        }
        prop_assert_eq!(log.results(), results);
    }

    /// Property: clear leaves both sequences empty
    #[test]
    fn prop_clear_empties_log(results in proptest::collection::vec(arb_result(), 1..10)) {
        let log = LocalLog::new(MemoryLocalStore::new());
        for result in &results {
            log.append_result(result).unwrap();
        }
        log.clear().unwrap();
        prop_assert!(log.results().is_empty());
        prop_assert!(log.events().is_empty());
    }

    /// Property: every cell parses back to its unescaped text
    #[test]
    fn prop_table_cells_parse_back(results in proptest::collection::vec(arb_result(), 1..10)) {
        let table = to_table(&results).unwrap();
        let text = table.to_csv();

        let mut reader = csv::ReaderBuilder::new().from_reader(text.as_bytes());
        let parsed: Vec<Vec<String>> = reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect();

        prop_assert_eq!(parsed.len(), results.len());
        prop_assert_eq!(&parsed[..], table.rows());
    }

    /// Property: an escaped cell is quoted exactly when it needs to be
    #[test]
    fn prop_escape_quotes_only_when_needed(text in arb_cell_text()) {
        let escaped = escape_cell(&text);
        let special = text.contains([',', '"', '\n']);
        prop_assert_eq!(escaped.starts_with('"') && escaped.len() >= 2, special);
        if !special {
            prop_assert_eq!(escaped, text);
        }
    }

    /// Property: summary counts partition the input
    #[test]
    fn prop_summary_counts_partition(results in proptest::collection::vec(arb_result(), 0..30)) {
        let summary = summarize(&results);
        prop_assert_eq!(
            summary.ui_a.count + summary.ui_b.count + summary.unclassified,
            results.len()
        );

        let a = results.iter().filter(|r| *r.ui_version() == UiVersion::A).count();
        prop_assert_eq!(summary.ui_a.count, a);
    }

    /// Property: rounded means stay inside the sampled range
    #[test]
    fn prop_summary_means_bounded(results in proptest::collection::vec(arb_result(), 0..30)) {
        let summary = summarize(&results);
        for group in [summary.ui_a, summary.ui_b] {
            prop_assert!((0..=600).contains(&group.avg_time_sec));
            prop_assert!((0..=100).contains(&group.avg_scroll));
        }
    }
}
