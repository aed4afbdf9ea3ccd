//! Per-arm summary statistics

use serde::{Deserialize, Serialize};

use crate::record::{TrialResult, UiVersion};

/// Statistics for one UI arm.
///
/// Means are rounded half-up to whole numbers. An empty group reports 0 for
/// both means; check `count` to tell it apart from a genuine 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    /// Results in the group.
    pub count: usize,
    /// Mean reading time in seconds.
    pub avg_time_sec: i64,
    /// Mean maximum scroll depth in percent.
    pub avg_scroll: i64,
}

/// Side-by-side comparison of the two arms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Arm A.
    pub ui_a: GroupSummary,
    /// Arm B.
    pub ui_b: GroupSummary,
    /// Results whose `uiVersion` is neither A nor B.
    pub unclassified: usize,
}

/// Summarize results by UI arm.
///
/// Absent measurements count as 0 toward the mean.
#[must_use]
pub fn summarize(results: &[TrialResult]) -> Summary {
    let group = |version: &UiVersion| {
        let members: Vec<&TrialResult> = results
            .iter()
            .filter(|r| r.ui_version() == version)
            .collect();
        GroupSummary {
            count: members.len(),
            avg_time_sec: rounded_mean(&members, TrialResult::reading_time_sec),
            avg_scroll: rounded_mean(&members, TrialResult::max_scroll_depth),
        }
    };

    let ui_a = group(&UiVersion::A);
    let ui_b = group(&UiVersion::B);

    Summary {
        ui_a,
        ui_b,
        unclassified: results.len() - ui_a.count - ui_b.count,
    }
}

#[allow(clippy::cast_precision_loss)]
#[allow(clippy::cast_possible_truncation)]
fn rounded_mean(members: &[&TrialResult], field: fn(&TrialResult) -> Option<f64>) -> i64 {
    if members.is_empty() {
        return 0;
    }
    let sum: f64 = members.iter().map(|r| field(r).unwrap_or(0.0)).sum();
    let mean = sum / members.len() as f64;
    (mean + 0.5).floor() as i64
}
