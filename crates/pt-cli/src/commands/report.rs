//! Stats report for `pt stats`.
//!
//! Renders a [`StatsSummary`] either as a human-readable breakdown with
//! progress bars or as JSON.

use std::collections::BTreeMap;
use std::fmt::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use pt_core::{StatsSummary, Window, summarize};
use serde::Serialize;

use super::query;
use super::util::format_ms;
use crate::Config;
use crate::cli::QueryArgs;

// ========== Duration Formatting ==========

/// Formats seconds as a short duration.
/// Returns "Xh Ym" if >= 1 hour, "Xm" if < 1 hour. Negative input is 0m.
pub fn format_duration(seconds: i64) -> String {
    if seconds < 0 {
        return "0m".to_string();
    }
    let total_minutes = seconds / 60;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Formats seconds in words: "1 hour 5 mins", "2 hours 1 min", "45 minutes".
pub fn format_duration_long(seconds: i64) -> String {
    let total_minutes = seconds.max(0) / 60;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours >= 1 {
        let hour_word = if hours == 1 { "hour" } else { "hours" };
        let min_word = if minutes == 1 { "min" } else { "mins" };
        format!("{hours} {hour_word} {minutes} {min_word}")
    } else {
        let min_word = if minutes == 1 { "minute" } else { "minutes" };
        format!("{minutes} {min_word}")
    }
}

// ========== Progress Bar ==========

/// Generates a 10-character progress bar.
/// Non-zero values under 5% of max get a single block for visibility.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn progress_bar(value: i64, max: i64) -> String {
    if max <= 0 {
        return "░░░░░░░░░░".to_string();
    }

    let ratio = value.max(0) as f64 / max as f64;
    let filled = if ratio < 0.05 && value > 0 {
        1
    } else {
        (ratio * 10.0).round().min(10.0) as usize
    };

    let empty = 10 - filled;
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

// ========== Human Output ==========

fn format_minute(timestamp_ms: i64) -> String {
    DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |dt| dt.format("%Y-%m-%d %H:%M").to_string(),
    )
}

fn format_row(output: &mut String, name: &str, seconds: i64, max: i64) {
    let duration = format_duration(seconds);
    let bar = progress_bar(seconds, max);
    writeln!(output, "{name:<20}  {duration:>7}  {bar}").unwrap();
}

fn format_section(output: &mut String, title: &str, totals: &BTreeMap<String, i64>) {
    writeln!(output).unwrap();
    writeln!(output, "{title}").unwrap();
    writeln!(output, "{}", "─".repeat(title.chars().count())).unwrap();

    if totals.is_empty() {
        writeln!(output, "(none)").unwrap();
        return;
    }

    // Largest first, ties by name
    let mut rows: Vec<_> = totals.iter().collect();
    rows.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    let max = rows.first().map_or(0, |(_, seconds)| **seconds);

    for (name, seconds) in rows {
        format_row(output, name, *seconds, max);
    }
}

/// Formats the human-readable stats output.
pub fn format_stats(window: Window, summary: &StatsSummary) -> String {
    let mut output = String::new();
    let totals = &summary.totals;

    writeln!(
        output,
        "STATS: {} to {} UTC",
        format_minute(window.start_ms),
        format_minute(window.end_ms)
    )
    .unwrap();

    if totals.total_seconds == 0 {
        writeln!(output).unwrap();
        writeln!(output, "No activity recorded in this window.").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "Hint: Run 'pt status' to check ingestion.").unwrap();
        return output;
    }

    writeln!(output).unwrap();
    writeln!(
        output,
        "Total: {}",
        format_duration_long(totals.total_seconds)
    )
    .unwrap();

    format_section(&mut output, "BY TOOL", &totals.by_tool);
    format_section(&mut output, "BY PROJECT", &totals.by_project);
    format_section(&mut output, "BY LANGUAGE", &totals.by_language);

    // Days stay in calendar order
    writeln!(output).unwrap();
    writeln!(output, "BY DAY").unwrap();
    writeln!(output, "──────").unwrap();
    let max_day = summary.by_day.iter().map(|d| d.seconds).max().unwrap_or(0);
    for day in &summary.by_day {
        format_row(&mut output, &day.date, day.seconds, max_day);
    }

    output
}

// ========== JSON Output ==========

#[derive(Debug, Serialize)]
pub struct JsonWindow {
    pub start: String,
    pub end: String,
}

/// JSON stats structure.
#[derive(Debug, Serialize)]
pub struct JsonStats<'a> {
    pub user: &'a str,
    pub window: JsonWindow,
    #[serde(flatten)]
    pub summary: &'a StatsSummary,
}

/// Formats stats as JSON.
pub fn format_stats_json(user: &str, window: Window, summary: &StatsSummary) -> Result<String> {
    let report = JsonStats {
        user,
        window: JsonWindow {
            start: format_ms(window.start_ms),
            end: format_ms(window.end_ms),
        },
        summary,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

// ========== Public Interface ==========

/// Renders stats for a query as of `now`.
pub fn render(args: &QueryArgs, config: &Config, now: DateTime<Utc>) -> Result<String> {
    let (query, pulses) = query::load(args, config, now)?;
    let summary = summarize(&pulses, query.window, &config.aggregation());

    if args.json {
        let mut output = format_stats_json(query.user.as_str(), query.window, &summary)?;
        output.push('\n');
        Ok(output)
    } else {
        Ok(format_stats(query.window, &summary))
    }
}

/// Runs the stats command.
pub fn run(args: &QueryArgs, config: &Config) -> Result<()> {
    let output = render(args, config, Utc::now())?;
    print!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;
    use insta::assert_snapshot;
    use pt_core::{AggregateResult, DayStats};

    fn window() -> Window {
        Window::between(
            Utc.with_ymd_and_hms(2025, 1, 14, 12, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap(),
        )
    }

    fn summary() -> StatsSummary {
        StatsSummary {
            totals: AggregateResult {
                total_seconds: 3720,
                by_tool: BTreeMap::from([
                    ("vscode".to_string(), 3600),
                    ("claude-code".to_string(), 120),
                ]),
                by_project: BTreeMap::from([("api".to_string(), 3720)]),
                by_language: BTreeMap::new(),
            },
            by_day: vec![
                DayStats {
                    date: "2025-01-14".to_string(),
                    seconds: 0,
                },
                DayStats {
                    date: "2025-01-15".to_string(),
                    seconds: 3720,
                },
            ],
        }
    }

    #[test]
    fn test_format_duration_hours_and_minutes() {
        assert_eq!(format_duration(3720), "1h 2m");
        assert_eq!(format_duration(7200), "2h 0m");
    }

    #[test]
    fn test_format_duration_minutes_only() {
        assert_eq!(format_duration(2700), "45m");
        assert_eq!(format_duration(0), "0m");
    }

    #[test]
    fn test_format_duration_floors_seconds() {
        assert_eq!(format_duration(119), "1m");
    }

    #[test]
    fn test_format_duration_negative_is_zero() {
        assert_eq!(format_duration(-60), "0m");
    }

    #[test]
    fn test_format_duration_long() {
        assert_eq!(format_duration_long(60), "1 minute");
        assert_eq!(format_duration_long(120), "2 minutes");
        assert_eq!(format_duration_long(30), "0 minutes");
        assert_eq!(format_duration_long(3600), "1 hour 0 mins");
        assert_eq!(format_duration_long(3660), "1 hour 1 min");
        assert_eq!(format_duration_long(7500), "2 hours 5 mins");
    }

    #[test]
    fn test_progress_bar_full() {
        assert_eq!(progress_bar(100, 100), "██████████");
    }

    #[test]
    fn test_progress_bar_partial() {
        assert_eq!(progress_bar(30, 100), "███░░░░░░░");
    }

    #[test]
    fn test_progress_bar_minimum() {
        assert_eq!(progress_bar(1, 100), "█░░░░░░░░░");
    }

    #[test]
    fn test_progress_bar_zero() {
        assert_eq!(progress_bar(0, 100), "░░░░░░░░░░");
        assert_eq!(progress_bar(0, 0), "░░░░░░░░░░");
    }

    #[test]
    fn test_stats_empty_window() {
        let output = format_stats(window(), &StatsSummary::default());
        assert_snapshot!(output, @r"
STATS: 2025-01-14 12:00 to 2025-01-15 12:00 UTC

No activity recorded in this window.

Hint: Run 'pt status' to check ingestion.
");
    }

    #[test]
    fn test_stats_breakdowns() {
        let output = format_stats(window(), &summary());
        assert_snapshot!(output, @r"
STATS: 2025-01-14 12:00 to 2025-01-15 12:00 UTC

Total: 1 hour 2 mins

BY TOOL
───────
vscode                  1h 0m  ██████████
claude-code                2m  █░░░░░░░░░

BY PROJECT
──────────
api                     1h 2m  ██████████

BY LANGUAGE
───────────
(none)

BY DAY
──────
2025-01-14                 0m  ░░░░░░░░░░
2025-01-15              1h 2m  ██████████
");
    }

    #[test]
    fn test_stats_json_output() {
        let output = format_stats_json("local", window(), &summary()).unwrap();
        assert_snapshot!(output, @r#"
{
  "user": "local",
  "window": {
    "start": "2025-01-14T12:00:00Z",
    "end": "2025-01-15T12:00:00Z"
  },
  "total_seconds": 3720,
  "by_tool": {
    "claude-code": 120,
    "vscode": 3600
  },
  "by_project": {
    "api": 3720
  },
  "by_language": {},
  "by_day": [
    {
      "date": "2025-01-14",
      "seconds": 0
    },
    {
      "date": "2025-01-15",
      "seconds": 3720
    }
  ]
}
"#);
    }

    #[test]
    fn test_render_from_file_reconciles_days_with_total() {
        use std::io::Write as _;

        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("pulses.jsonl");
        let mut file = std::fs::File::create(&path).unwrap();
        // 23:58, 23:59 on Jan 14 and 00:01 on Jan 15: 3 minutes across midnight.
        for ts in [1_736_899_080_000_i64, 1_736_899_140_000, 1_736_899_260_000] {
            writeln!(
                file,
                r#"{{"tool":"vscode","timestamp":{ts},"activity_type":"coding","language":"rust"}}"#
            )
            .unwrap();
        }

        let config = Config {
            database_path: temp.path().join("pt.db"),
            ..Config::default()
        };
        let args = QueryArgs {
            file: Some(path),
            json: true,
            ..QueryArgs::default()
        };
        let now = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();

        let output = render(&args, &config, now).unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(json["total_seconds"], 180);
        assert_eq!(json["by_language"]["rust"], 180);
        let days = json["by_day"].as_array().unwrap();
        assert_eq!(days.len(), 8);
        let day_sum: i64 = days.iter().map(|d| d["seconds"].as_i64().unwrap()).sum();
        assert_eq!(day_sum, 180);
        assert_eq!(days[6]["date"], "2025-01-14");
        // Both intervals start on Jan 14.
        assert_eq!(days[6]["seconds"], 180);
        assert_eq!(days[7]["seconds"], 0);
    }
}
