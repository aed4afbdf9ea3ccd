//! Table export: one CSV row per trial result
//!
//! The column set and order are fixed; analysis scripts index by position.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::record::TrialResult;
use crate::{Error, Result};

/// Columns of the results table, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    /// `participantId`
    ParticipantId,
    /// `uiVersion`
    UiVersion,
    /// `articleId`
    ArticleId,
    /// `articleTopic`
    ArticleTopic,
    /// `startTime`
    StartTime,
    /// `endTime`
    EndTime,
    /// `readingTimeSec`
    ReadingTimeSec,
    /// `maxScrollDepth`
    MaxScrollDepth,
    /// `distractionClicks`
    DistractionClicks,
    /// `focusModeUsed`
    FocusModeUsed,
    /// `focusModeTimeSec`
    FocusModeTimeSec,
    /// `comprehensionScore`
    ComprehensionScore,
    /// `perceivedFocus`
    PerceivedFocus,
    /// `perceivedReadability`
    PerceivedReadability,
    /// `completedAt`
    CompletedAt,
}

impl Column {
    /// Every column, in output order.
    pub const ALL: [Self; 15] = [
        Self::ParticipantId,
        Self::UiVersion,
        Self::ArticleId,
        Self::ArticleTopic,
        Self::StartTime,
        Self::EndTime,
        Self::ReadingTimeSec,
        Self::MaxScrollDepth,
        Self::DistractionClicks,
        Self::FocusModeUsed,
        Self::FocusModeTimeSec,
        Self::ComprehensionScore,
        Self::PerceivedFocus,
        Self::PerceivedReadability,
        Self::CompletedAt,
    ];

    /// Header name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ParticipantId => "participantId",
            Self::UiVersion => "uiVersion",
            Self::ArticleId => "articleId",
            Self::ArticleTopic => "articleTopic",
            Self::StartTime => "startTime",
            Self::EndTime => "endTime",
            Self::ReadingTimeSec => "readingTimeSec",
            Self::MaxScrollDepth => "maxScrollDepth",
            Self::DistractionClicks => "distractionClicks",
            Self::FocusModeUsed => "focusModeUsed",
            Self::FocusModeTimeSec => "focusModeTimeSec",
            Self::ComprehensionScore => "comprehensionScore",
            Self::PerceivedFocus => "perceivedFocus",
            Self::PerceivedReadability => "perceivedReadability",
            Self::CompletedAt => "completedAt",
        }
    }

    /// Unescaped cell text for `result`; `None` when the field is absent.
    #[must_use]
    pub fn value(self, result: &TrialResult) -> Option<String> {
        match self {
            Self::ParticipantId => Some(result.participant_id().to_string()),
            Self::UiVersion => Some(result.ui_version().to_string()),
            Self::ArticleId => result.article_id().map(str::to_string),
            Self::ArticleTopic => result.article_topic().map(str::to_string),
            Self::StartTime => result.start_time().map(|v| v.to_string()),
            Self::EndTime => result.end_time().map(|v| v.to_string()),
            Self::ReadingTimeSec => result.reading_time_sec().map(|v| v.to_string()),
            Self::MaxScrollDepth => result.max_scroll_depth().map(|v| v.to_string()),
            Self::DistractionClicks => result.distraction_clicks().map(|v| v.to_string()),
            Self::FocusModeUsed => result.focus_mode_used().map(|v| v.to_string()),
            Self::FocusModeTimeSec => result.focus_mode_time_sec().map(|v| v.to_string()),
            Self::ComprehensionScore => result.comprehension_score().map(|v| v.to_string()),
            Self::PerceivedFocus => result.perceived_focus().map(|v| v.to_string()),
            Self::PerceivedReadability => result.perceived_readability().map(|v| v.to_string()),
            Self::CompletedAt => result
                .completed_at()
                .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }
}

/// Header line of every table export.
#[must_use]
pub fn header_line() -> String {
    Column::ALL.map(Column::name).join(",")
}

/// Results rendered as rows of cell text (unescaped, absent fields empty).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Data rows, one per result, in log order.
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// CSV text: header then rows, `\n`-separated, no trailing newline.
    #[must_use]
    pub fn to_csv(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&header_line())?;
        for row in &self.rows {
            f.write_str("\n")?;
            for (i, cell) in row.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                f.write_str(&escape_cell(cell))?;
            }
        }
        Ok(())
    }
}

/// Quote a cell if it contains a comma, quote, CR or LF; embedded quotes
/// are doubled.
#[must_use]
pub fn escape_cell(value: &str) -> String {
    let needs_quoting = value.contains([',', '"', '\n', '\r']);
    if needs_quoting {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Build the results table.
///
/// # Errors
/// Returns `Error::NothingToExport` if `results` is empty
pub fn to_table(results: &[TrialResult]) -> Result<Table> {
    if results.is_empty() {
        return Err(Error::NothingToExport);
    }
    let rows = results
        .iter()
        .map(|result| {
            Column::ALL
                .iter()
                .map(|column| column.value(result).unwrap_or_default())
                .collect()
        })
        .collect();
    Ok(Table { rows })
}

/// `hci_study_results_<epoch-ms>.csv`
#[must_use]
pub fn table_filename(at: DateTime<Utc>) -> String {
    format!("hci_study_results_{}.csv", at.timestamp_millis())
}

/// Write `table` as CSV into `dir` and return the file path.
///
/// # Errors
/// Returns error if the write fails
pub fn save_table<P: AsRef<Path>>(dir: P, table: &Table, at: DateTime<Utc>) -> Result<PathBuf> {
    let path = dir.as_ref().join(table_filename(at));
    fs::write(&path, table.to_csv())?;
    Ok(path)
}
