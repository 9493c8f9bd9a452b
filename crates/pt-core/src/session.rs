//! Session grouping: contiguous runs of pulses under one tool and project.

use serde::{Deserialize, Serialize};

use crate::aggregate::round_seconds;
use crate::pulse::{Pulse, sorted_pulses};
use crate::types::UserId;

/// A continuous work period derived from pulses.
///
/// Sessions are computed per request and never persisted; `id` only exists
/// so callers can describe a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// `<user_id>-<start_time>`.
    pub id: String,
    pub user_id: UserId,
    pub tool: String,
    pub project: Option<String>,
    /// Epoch milliseconds of the first pulse.
    pub start_time: i64,
    /// Epoch milliseconds of the last pulse.
    pub end_time: i64,
    pub duration_seconds: i64,
    pub pulse_count: usize,
}

/// Running state for the session currently being extended.
#[derive(Debug)]
struct OpenSession<'a> {
    tool: &'a str,
    project: Option<&'a str>,
    start: i64,
    end: i64,
    count: usize,
}

impl<'a> OpenSession<'a> {
    fn seed(pulse: &'a Pulse) -> Self {
        Self {
            tool: &pulse.tool,
            project: pulse.project.as_deref(),
            start: pulse.timestamp,
            end: pulse.timestamp,
            count: 1,
        }
    }

    /// Whether `pulse` starts a new session.
    ///
    /// A gap exactly equal to the threshold does not split.
    fn is_boundary(&self, pulse: &Pulse, gap_threshold_ms: i64) -> bool {
        let gap = pulse.timestamp - self.end;
        gap > gap_threshold_ms
            || pulse.tool != self.tool
            || pulse.project.as_deref() != self.project
    }

    fn close(self, user_id: &UserId) -> Session {
        Session {
            id: format!("{user_id}-{}", self.start),
            user_id: user_id.clone(),
            tool: self.tool.to_string(),
            project: self.project.map(str::to_string),
            start_time: self.start,
            end_time: self.end,
            duration_seconds: round_seconds(self.end - self.start),
            pulse_count: self.count,
        }
    }
}

/// Partitions pulses into sessions ordered by start time.
///
/// A new session starts when the gap since the previous pulse exceeds
/// `gap_threshold_ms`, or when the tool or project changes. Input order does
/// not matter; the slice itself is never reordered.
pub fn group_into_sessions(
    pulses: &[Pulse],
    user_id: &UserId,
    gap_threshold_ms: i64,
) -> Vec<Session> {
    let sorted = sorted_pulses(pulses);
    let mut iter = sorted.into_iter();
    let Some(first) = iter.next() else {
        return Vec::new();
    };

    let mut sessions = Vec::new();
    let mut current = OpenSession::seed(first);

    for pulse in iter {
        if current.is_boundary(pulse, gap_threshold_ms) {
            let next = OpenSession::seed(pulse);
            sessions.push(std::mem::replace(&mut current, next).close(user_id));
        } else {
            current.end = pulse.timestamp;
            current.count += 1;
        }
    }
    sessions.push(current.close(user_id));

    tracing::trace!(
        pulses = pulses.len(),
        sessions = sessions.len(),
        "grouped pulses into sessions"
    );
    sessions
}
