//! Shared utilities for CLI commands.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Utc};
use pt_core::window::day_start;
use pt_core::{Pulse, Window};
use pt_db::Database;
use regex::Regex;

use crate::Config;
use crate::cli::QueryArgs;

/// Pre-compiled regex for relative time parsing.
static RELATIVE_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(minute|hour|day|week)s?\s+ago$").unwrap());

/// Conservative bounds for relative time parsing (~1000 years in minutes).
const MAX_RELATIVE_MINUTES: i64 = 1000 * 365 * 24 * 60;

/// Window length used when only `--end` is given.
const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Parse a datetime string as ISO 8601, a bare UTC date, or relative time.
///
/// Supports:
/// - ISO 8601: "2026-01-15T10:30:00Z"
/// - Date: "2026-01-15" (UTC midnight)
/// - Relative: "2 hours ago", "30 minutes ago", "1 day ago", "1 week ago"
pub fn parse_datetime(s: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(day_start(date));
    }

    // Try relative time: "N hours/minutes/days/weeks ago"
    let Some(caps) = RELATIVE_TIME_RE.captures(s) else {
        anyhow::bail!(
            "Invalid datetime: {s}. Use ISO 8601 (e.g., 2026-01-15T10:30:00Z), a date (2026-01-15) or relative (e.g., '2 hours ago')"
        );
    };

    let n: i64 = caps[1]
        .parse()
        .context("failed to parse number in relative time")?;

    let (max_for_unit, minutes_per_unit) = match &caps[2] {
        "minute" => (MAX_RELATIVE_MINUTES, 1),
        "hour" => (MAX_RELATIVE_MINUTES / 60, 60),
        "day" => (MAX_RELATIVE_MINUTES / (60 * 24), 60 * 24),
        "week" => (MAX_RELATIVE_MINUTES / (60 * 24 * 7), 60 * 24 * 7),
        unit => anyhow::bail!("Unknown time unit: {unit}"),
    };

    if n > max_for_unit {
        anyhow::bail!("Relative time value too large: {n} {}", &caps[2]);
    }

    Ok(now - Duration::minutes(n * minutes_per_unit))
}

/// Resolves the query window from `--start`/`--end`, falling back to `--range`.
///
/// With only `--end`, the window reaches back a week from it. With only
/// `--start`, it runs until `now`.
pub fn resolve_window(args: &QueryArgs, now: DateTime<Utc>) -> Result<Window> {
    if args.start.is_none() && args.end.is_none() {
        return Ok(args.range.window_at(now));
    }

    let end = match &args.end {
        Some(end) => parse_datetime(end, now).context("invalid --end")?,
        None => now,
    };
    let start = match &args.start {
        Some(start) => parse_datetime(start, now).context("invalid --start")?,
        None => end - Duration::days(DEFAULT_WINDOW_DAYS),
    };
    Ok(Window::between(start, end))
}

/// Formats epoch milliseconds as an RFC 3339 UTC string.
pub fn format_ms(timestamp_ms: i64) -> String {
    DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true),
    )
}

/// Parses JSON-lines pulses, skipping blank lines.
///
/// Every pulse is validated; errors name the offending line.
pub fn parse_pulses<R: BufRead>(reader: R) -> Result<Vec<Pulse>> {
    let mut pulses = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", idx + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let pulse: Pulse = serde_json::from_str(trimmed)
            .with_context(|| format!("invalid JSON on line {}", idx + 1))?;
        pulse
            .validate()
            .with_context(|| format!("invalid pulse on line {}", idx + 1))?;
        pulses.push(pulse);
    }
    Ok(pulses)
}

/// Reads pulses from a JSON-lines file.
pub fn read_pulse_file(path: &Path) -> Result<Vec<Pulse>> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    parse_pulses(BufReader::new(file)).with_context(|| format!("failed to read {}", path.display()))
}

/// Opens the configured database, ensuring the parent directory exists.
pub fn open_database(config: &Config) -> Result<Database> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))
}
