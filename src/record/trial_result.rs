//! Trial Result - one completed reading task for one participant

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Experimental condition (UI arm) a trial was run under.
///
/// The study has two arms. Values outside `A`/`B` are carried through as
/// [`UiVersion::Other`] so that malformed caller data is preserved and can
/// be reported, not rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UiVersion {
    /// Baseline interface.
    A,
    /// Variant interface.
    B,
    /// Any unrecognised version label.
    Other(String),
}

impl UiVersion {
    /// Label as written to storage and exports.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for UiVersion {
    fn from(label: String) -> Self {
        match label.as_str() {
            "A" => Self::A,
            "B" => Self::B,
            _ => Self::Other(label),
        }
    }
}

impl From<&str> for UiVersion {
    fn from(label: &str) -> Self {
        Self::from(label.to_string())
    }
}

impl From<UiVersion> for String {
    fn from(version: UiVersion) -> Self {
        match version {
            UiVersion::A => "A".to_string(),
            UiVersion::B => "B".to_string(),
            UiVersion::Other(label) => label,
        }
    }
}

impl fmt::Display for UiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trial Result represents one completed study trial.
///
/// Only the participant and the UI arm are required. Every measurement may
/// be absent, in which case it is omitted from the serialized form and
/// rendered as an empty cell in table exports. Fields the caller attaches
/// beyond the known schema (e.g. `sessionId`) are kept in [`extra`] and
/// survive every storage round trip.
///
/// [`extra`]: TrialResult::extra
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrialResult {
    participant_id: String,
    ui_version: UiVersion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    article_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    article_topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reading_time_sec: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_scroll_depth: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    distraction_clicks: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    focus_mode_used: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    focus_mode_time_sec: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    comprehension_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    perceived_focus: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    perceived_readability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completed_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TrialResult {
    /// Serialized names of the schema fields, in table column order.
    ///
    /// `extra` never holds one of these keys.
    pub const FIELDS: [&'static str; 15] = [
        "participantId",
        "uiVersion",
        "articleId",
        "articleTopic",
        "startTime",
        "endTime",
        "readingTimeSec",
        "maxScrollDepth",
        "distractionClicks",
        "focusModeUsed",
        "focusModeTimeSec",
        "comprehensionScore",
        "perceivedFocus",
        "perceivedReadability",
        "completedAt",
    ];

    /// Create a result with only the required fields set.
    #[must_use]
    pub fn new(participant_id: impl Into<String>, ui_version: impl Into<UiVersion>) -> Self {
        TrialResultBuilder::new(participant_id, ui_version).build()
    }

    /// Create a builder for a result with measurements.
    #[must_use]
    pub fn builder(
        participant_id: impl Into<String>,
        ui_version: impl Into<UiVersion>,
    ) -> TrialResultBuilder {
        TrialResultBuilder::new(participant_id, ui_version)
    }

    /// Get the participant ID.
    #[must_use]
    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    /// Get the UI arm.
    #[must_use]
    pub const fn ui_version(&self) -> &UiVersion {
        &self.ui_version
    }

    /// Get the article ID.
    #[must_use]
    pub fn article_id(&self) -> Option<&str> {
        self.article_id.as_deref()
    }

    /// Get the article topic.
    #[must_use]
    pub fn article_topic(&self) -> Option<&str> {
        self.article_topic.as_deref()
    }

    /// Trial start, ms since epoch.
    #[must_use]
    pub const fn start_time(&self) -> Option<i64> {
        self.start_time
    }

    /// Trial end, ms since epoch.
    #[must_use]
    pub const fn end_time(&self) -> Option<i64> {
        self.end_time
    }

    /// Reading time in seconds.
    #[must_use]
    pub const fn reading_time_sec(&self) -> Option<f64> {
        self.reading_time_sec
    }

    /// Maximum scroll depth, percent of the article.
    #[must_use]
    pub const fn max_scroll_depth(&self) -> Option<f64> {
        self.max_scroll_depth
    }

    /// Number of clicks on distracting page elements.
    #[must_use]
    pub const fn distraction_clicks(&self) -> Option<u32> {
        self.distraction_clicks
    }

    /// Whether focus mode was switched on during the trial.
    #[must_use]
    pub const fn focus_mode_used(&self) -> Option<bool> {
        self.focus_mode_used
    }

    /// Seconds spent in focus mode.
    #[must_use]
    pub const fn focus_mode_time_sec(&self) -> Option<f64> {
        self.focus_mode_time_sec
    }

    /// Comprehension quiz score.
    #[must_use]
    pub const fn comprehension_score(&self) -> Option<f64> {
        self.comprehension_score
    }

    /// Self-reported focus rating.
    #[must_use]
    pub const fn perceived_focus(&self) -> Option<f64> {
        self.perceived_focus
    }

    /// Self-reported readability rating.
    #[must_use]
    pub const fn perceived_readability(&self) -> Option<f64> {
        self.perceived_readability
    }

    /// When the participant finished the trial.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Caller-defined fields outside the known schema.
    #[must_use]
    pub const fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }
}

/// Builder for `TrialResult`.
#[derive(Debug)]
pub struct TrialResultBuilder {
    result: TrialResult,
}

impl TrialResultBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(participant_id: impl Into<String>, ui_version: impl Into<UiVersion>) -> Self {
        Self {
            result: TrialResult {
                participant_id: participant_id.into(),
                ui_version: ui_version.into(),
                article_id: None,
                article_topic: None,
                start_time: None,
                end_time: None,
                reading_time_sec: None,
                max_scroll_depth: None,
                distraction_clicks: None,
                focus_mode_used: None,
                focus_mode_time_sec: None,
                comprehension_score: None,
                perceived_focus: None,
                perceived_readability: None,
                completed_at: None,
                extra: Map::new(),
            },
        }
    }

    /// Set the article ID and topic.
    #[must_use]
    pub fn article(mut self, id: impl Into<String>, topic: impl Into<String>) -> Self {
        self.result.article_id = Some(id.into());
        self.result.article_topic = Some(topic.into());
        self
    }

    /// Set start and end times (ms since epoch).
    #[must_use]
    pub const fn times(mut self, start_ms: i64, end_ms: i64) -> Self {
        self.result.start_time = Some(start_ms);
        self.result.end_time = Some(end_ms);
        self
    }

    /// Set the reading time.
    #[must_use]
    pub const fn reading_time_sec(mut self, secs: f64) -> Self {
        self.result.reading_time_sec = Some(secs);
        self
    }

    /// Set the maximum scroll depth.
    #[must_use]
    pub const fn max_scroll_depth(mut self, percent: f64) -> Self {
        self.result.max_scroll_depth = Some(percent);
        self
    }

    /// Set the distraction click count.
    #[must_use]
    pub const fn distraction_clicks(mut self, clicks: u32) -> Self {
        self.result.distraction_clicks = Some(clicks);
        self
    }

    /// Set focus mode usage and time spent in it.
    #[must_use]
    pub const fn focus_mode(mut self, used: bool, secs: f64) -> Self {
        self.result.focus_mode_used = Some(used);
        self.result.focus_mode_time_sec = Some(secs);
        self
    }

    /// Set the comprehension score.
    #[must_use]
    pub const fn comprehension_score(mut self, score: f64) -> Self {
        self.result.comprehension_score = Some(score);
        self
    }

    /// Set the questionnaire ratings.
    #[must_use]
    pub const fn perceived(mut self, focus: f64, readability: f64) -> Self {
        self.result.perceived_focus = Some(focus);
        self.result.perceived_readability = Some(readability);
        self
    }

    /// Set the completion timestamp.
    #[must_use]
    pub const fn completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.result.completed_at = Some(at);
        self
    }

    /// Attach a caller-defined field outside the known schema.
    ///
    /// A key naming a schema field (see [`TrialResult::FIELDS`]) is ignored
    /// with a warning; set it through its own builder method instead.
    #[must_use]
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if TrialResult::FIELDS.contains(&key.as_str()) {
            warn!(key = %key, "extra field shadows a schema field, ignored");
            return self;
        }
        self.result.extra.insert(key, value.into());
        self
    }

    /// Build the `TrialResult`.
    #[must_use]
    pub fn build(self) -> TrialResult {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ui_version_parsing() {
        assert_eq!(UiVersion::from("A"), UiVersion::A);
        assert_eq!(UiVersion::from("B"), UiVersion::B);
        assert_eq!(UiVersion::from("a"), UiVersion::Other("a".to_string()));
        assert_eq!(UiVersion::from("C").as_str(), "C");
    }

    #[test]
    fn test_serializes_camel_case_and_skips_absent() {
        let result = TrialResult::builder("p1", UiVersion::B)
            .reading_time_sec(12.5)
            .build();
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "participantId": "p1",
                "uiVersion": "B",
                "readingTimeSec": 12.5
            })
        );
    }

    #[test]
    fn test_extra_fields_survive_round_trip() {
        let raw = r#"{"participantId":"p9","uiVersion":"A","sessionId":"s-42","readingTimeSec":3}"#;
        let result: TrialResult = serde_json::from_str(raw).unwrap();

        assert_eq!(result.extra().get("sessionId"), Some(&Value::from("s-42")));
        assert_eq!(result.reading_time_sec(), Some(3.0));

        let back = serde_json::to_value(&result).unwrap();
        assert_eq!(back["sessionId"], "s-42");
    }

    #[test]
    fn test_unknown_ui_version_is_preserved() {
        let raw = r#"{"participantId":"p1","uiVersion":"C"}"#;
        let result: TrialResult = serde_json::from_str(raw).unwrap();
        assert_eq!(result.ui_version(), &UiVersion::Other("C".to_string()));
        assert_eq!(serde_json::to_value(&result).unwrap()["uiVersion"], "C");
    }

    #[test]
    fn test_extra_ignores_schema_keys() {
        let result = TrialResult::builder("p1", UiVersion::A)
            .extra("uiVersion", "B")
            .extra("readingTimeSec", "slow")
            .extra("sessionId", "s-1")
            .build();

        assert_eq!(result.ui_version(), &UiVersion::A);
        assert_eq!(result.reading_time_sec(), None);
        assert_eq!(result.extra().len(), 1);

        let back: TrialResult = serde_json::from_value(serde_json::to_value(&result).unwrap()).unwrap();
        assert_eq!(back, result);
    }
}
