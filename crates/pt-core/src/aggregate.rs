//! Time aggregation over pulse intervals.
//!
//! Elapsed time is inferred from the gap between consecutive pulses (sorted
//! by timestamp). A gap strictly shorter than the gap threshold counts as
//! work and is attributed to the earlier pulse's context; longer gaps count
//! as nothing.
//!
//! Both accumulators here sum the same qualifying gaps, so the per-day
//! series always adds up to the scalar total for the same pulses.
//!
//! Note the asymmetry with [`crate::group_into_sessions`]: a gap exactly at
//! the threshold keeps a session together but contributes no time here.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::pulse::{Pulse, Timestamped, chronological, sorted_pulses};
use crate::window::{Window, day_key, day_start, utc_day};

/// Default maximum gap between pulses that still counts as work (15 minutes).
pub const DEFAULT_GAP_THRESHOLD_MS: i64 = 900_000;

/// Configuration shared by every aggregation entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Maximum inter-pulse gap treated as continuous work.
    /// Default: 900000 (15 minutes).
    pub gap_threshold_ms: i64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            gap_threshold_ms: DEFAULT_GAP_THRESHOLD_MS,
        }
    }
}

impl AggregationConfig {
    /// Seconds credited for a gap, or `None` if the gap is too long.
    fn credited_seconds(&self, gap_ms: i64) -> Option<i64> {
        (gap_ms < self.gap_threshold_ms).then(|| round_seconds(gap_ms))
    }
}

/// Rounds milliseconds to the nearest second, halves rounding up.
pub(crate) const fn round_seconds(ms: i64) -> i64 {
    (ms + 500).div_euclid(1000)
}

/// Scalar and per-category totals in seconds.
///
/// Maps only contain categories that accumulated time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub total_seconds: i64,
    pub by_tool: BTreeMap<String, i64>,
    pub by_project: BTreeMap<String, i64>,
    pub by_language: BTreeMap<String, i64>,
}

impl AggregateResult {
    fn credit(&mut self, pulse: &Pulse, seconds: i64) {
        self.total_seconds += seconds;
        *self.by_tool.entry(pulse.tool.clone()).or_insert(0) += seconds;
        if let Some(project) = pulse.project_key() {
            *self.by_project.entry(project.to_string()).or_insert(0) += seconds;
        }
        if let Some(language) = pulse.language_key() {
            *self.by_language.entry(language.to_string()).or_insert(0) += seconds;
        }
    }
}

/// Elapsed time for one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayStats {
    /// `YYYY-MM-DD` in UTC.
    pub date: String,
    pub seconds: i64,
}

/// Totals plus the per-day series for one window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSummary {
    #[serde(flatten)]
    pub totals: AggregateResult,
    pub by_day: Vec<DayStats>,
}

/// Sums qualifying inter-pulse gaps overall and by tool, project and language.
pub fn aggregate_stats(pulses: &[Pulse], config: &AggregationConfig) -> AggregateResult {
    credit_sorted(&sorted_pulses(pulses), config)
}

/// Credits consecutive pairs of already sorted pulses.
fn credit_sorted(sorted: &[&Pulse], config: &AggregationConfig) -> AggregateResult {
    let mut result = AggregateResult::default();

    for pair in sorted.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);
        if let Some(seconds) = config.credited_seconds(curr.timestamp - prev.timestamp) {
            result.credit(prev, seconds);
        }
    }

    result
}

/// Per-UTC-day totals across `window`, zero-filled.
///
/// Every day from the UTC midnight of `window.start_ms` through
/// `window.end_ms` is present. Interval time goes to the day of the earlier
/// pulse, even when the later one falls after midnight; days outside the
/// window that receive time are added as well. Intervals starting at a
/// timestamp with no UTC calendar day are left out; `Pulse::validate`
/// rejects such timestamps. An inverted window yields an
/// empty series.
pub fn aggregate_by_day<T: Timestamped>(
    pulses: &[T],
    window: Window,
    config: &AggregationConfig,
) -> Vec<DayStats> {
    if window.is_inverted() {
        tracing::debug!(?window, "inverted window, no day buckets");
        return Vec::new();
    }

    let mut buckets = seed_day_buckets(window);

    let mut timestamps: Vec<i64> = pulses.iter().map(Timestamped::timestamp_ms).collect();
    timestamps.sort_unstable();

    for pair in timestamps.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);
        let Some(seconds) = config.credited_seconds(curr - prev) else {
            continue;
        };
        let Some(day) = utc_day(prev) else {
            tracing::trace!(timestamp = prev, "timestamp outside calendar range");
            continue;
        };
        *buckets.entry(day_key(day)).or_insert(0) += seconds;
    }

    let mut days: Vec<DayStats> = buckets
        .into_iter()
        .map(|(date, seconds)| DayStats { date, seconds })
        .collect();
    days.sort_unstable_by(|a, b| a.date.cmp(&b.date));
    days
}

/// One zeroed bucket per UTC day whose midnight is within the window.
fn seed_day_buckets(window: Window) -> HashMap<String, i64> {
    let mut buckets = HashMap::new();
    let Some(mut day) = utc_day(window.start_ms) else {
        return buckets;
    };

    while day_start(day).timestamp_millis() <= window.end_ms {
        buckets.insert(day_key(day), 0);
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }

    buckets
}

/// Totals and day series for the pulses inside `window`.
///
/// Pulses outside the window are ignored by both views so that the day
/// series always reconciles with `total_seconds`.
pub fn summarize(pulses: &[Pulse], window: Window, config: &AggregationConfig) -> StatsSummary {
    let mut in_window: Vec<&Pulse> = pulses
        .iter()
        .filter(|p| window.contains(p.timestamp))
        .collect();
    in_window.sort_by(|a, b| chronological(a, b));

    let totals = credit_sorted(&in_window, config);
    let by_day = aggregate_by_day(&in_window, window, config);

    tracing::debug!(
        pulses = in_window.len(),
        total_seconds = totals.total_seconds,
        days = by_day.len(),
        "summarized pulses"
    );

    StatsSummary { totals, by_day }
}
