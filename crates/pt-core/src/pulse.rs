//! Activity pulses emitted by editor and agent integrations.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::activity::ActivityType;
use crate::types::ValidationError;
use crate::window::utc_day;

/// A discrete, timestamped activity signal.
///
/// Pulses are sparse: the time between two of them is only counted as work
/// when the gap is short enough (see [`crate::AggregationConfig`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pulse {
    /// The tool that emitted the pulse (e.g. `vscode`, `claude-code`).
    pub tool: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub activity_type: ActivityType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_id: Option<String>,

    /// Whether the pulse was caused by a write (save, edit).
    #[serde(default)]
    pub is_write: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor_line: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_in: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_out: Option<i64>,
    /// Agent session the pulse belongs to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl Pulse {
    /// Creates a pulse with only the required fields set.
    pub fn new(tool: impl Into<String>, timestamp: i64, activity_type: ActivityType) -> Self {
        Self {
            tool: tool.into(),
            timestamp,
            activity_type,
            project: None,
            file: None,
            language: None,
            branch: None,
            machine_id: None,
            is_write: false,
            lines: None,
            cursor_line: None,
            tokens_in: None,
            tokens_out: None,
            session_id: None,
        }
    }

    #[must_use]
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    #[must_use]
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Checks the fields the aggregation engine relies on.
    ///
    /// Timestamps must be positive and fall on a UTC calendar day, so every
    /// valid pulse lands in a day bucket.
    ///
    /// The engine itself never validates; this is for ingestion boundaries.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.tool.trim().is_empty() {
            return Err(ValidationError::Empty { field: "tool" });
        }
        if self.timestamp <= 0 {
            return Err(ValidationError::NonPositiveTimestamp {
                value: self.timestamp,
            });
        }
        if utc_day(self.timestamp).is_none() {
            return Err(ValidationError::TimestampOutOfRange {
                value: self.timestamp,
            });
        }
        Ok(())
    }

    /// Project name if present and non-empty.
    pub fn project_key(&self) -> Option<&str> {
        self.project.as_deref().filter(|p| !p.is_empty())
    }

    /// Language name if present and non-empty.
    pub fn language_key(&self) -> Option<&str> {
        self.language.as_deref().filter(|l| !l.is_empty())
    }
}

/// Validates every pulse in a batch. Empty batches are rejected.
pub fn validate_batch(pulses: &[Pulse]) -> Result<(), ValidationError> {
    if pulses.is_empty() {
        return Err(ValidationError::EmptyBatch);
    }
    pulses.iter().try_for_each(Pulse::validate)
}

/// Anything that carries an epoch-millisecond timestamp.
///
/// The day accumulator only needs timestamps, so it accepts bare `i64`s as
/// well as full pulses.
pub trait Timestamped {
    fn timestamp_ms(&self) -> i64;
}

impl Timestamped for Pulse {
    fn timestamp_ms(&self) -> i64 {
        self.timestamp
    }
}

impl Timestamped for i64 {
    fn timestamp_ms(&self) -> i64 {
        *self
    }
}

impl<T: Timestamped> Timestamped for &T {
    fn timestamp_ms(&self) -> i64 {
        (*self).timestamp_ms()
    }
}

/// Total order used to sort pulses: timestamp first, then attribution
/// context so equal timestamps sort the same regardless of input order.
pub(crate) fn chronological(a: &Pulse, b: &Pulse) -> Ordering {
    a.timestamp
        .cmp(&b.timestamp)
        .then_with(|| a.tool.cmp(&b.tool))
        .then_with(|| a.project.cmp(&b.project))
        .then_with(|| a.language.cmp(&b.language))
        .then_with(|| a.activity_type.cmp(&b.activity_type))
        .then_with(|| a.file.cmp(&b.file))
}

/// Borrowed copy of `pulses` in chronological order. The input is untouched.
pub(crate) fn sorted_pulses(pulses: &[Pulse]) -> Vec<&Pulse> {
    let mut sorted: Vec<&Pulse> = pulses.iter().collect();
    sorted.sort_by(|a, b| chronological(a, b));
    sorted
}
