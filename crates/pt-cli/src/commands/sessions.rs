//! Sessions command: lists contiguous work periods.

use std::fmt::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use pt_core::{Session, group_into_sessions};

use super::query;
use super::report::format_duration;
use crate::Config;
use crate::cli::QueryArgs;

fn format_start(timestamp_ms: i64) -> String {
    DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |dt| dt.format("%Y-%m-%d %H:%M").to_string(),
    )
}

/// Formats sessions as a table, oldest first.
pub fn format_sessions(sessions: &[Session]) -> String {
    let mut output = String::new();

    if sessions.is_empty() {
        writeln!(output, "No sessions in this window.").unwrap();
        return output;
    }

    let total: i64 = sessions.iter().map(|s| s.duration_seconds).sum();
    writeln!(
        output,
        "SESSIONS: {} ({} total)",
        sessions.len(),
        format_duration(total)
    )
    .unwrap();
    writeln!(output).unwrap();
    writeln!(
        output,
        "{:<16}  {:>8}  {:>6}  {:<14}  PROJECT",
        "START (UTC)", "DURATION", "PULSES", "TOOL"
    )
    .unwrap();

    for session in sessions {
        let project = session.project.as_deref().unwrap_or("-");
        writeln!(
            output,
            "{:<16}  {:>8}  {:>6}  {:<14}  {project}",
            format_start(session.start_time),
            format_duration(session.duration_seconds),
            session.pulse_count,
            session.tool,
        )
        .unwrap();
    }

    output
}

/// Renders sessions for a query as of `now`.
pub fn render(args: &QueryArgs, config: &Config, now: DateTime<Utc>) -> Result<String> {
    let (query, pulses) = query::load(args, config, now)?;
    let sessions = group_into_sessions(&pulses, &query.user, config.gap_threshold_ms);

    if args.json {
        let mut output = serde_json::to_string_pretty(&sessions)?;
        output.push('\n');
        Ok(output)
    } else {
        Ok(format_sessions(&sessions))
    }
}

/// Runs the sessions command.
pub fn run(args: &QueryArgs, config: &Config) -> Result<()> {
    let output = render(args, config, Utc::now())?;
    print!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use pt_core::{ActivityType, Pulse, UserId};

    // 2025-01-15T10:00:00Z
    const BASE: i64 = 1_736_935_200_000;
    const MINUTE: i64 = 60_000;

    fn pulse(tool: &str, offset_min: i64, project: Option<&str>) -> Pulse {
        let pulse = Pulse::new(tool, BASE + offset_min * MINUTE, ActivityType::Coding);
        match project {
            Some(project) => pulse.with_project(project),
            None => pulse,
        }
    }

    #[test]
    fn test_sessions_empty() {
        assert_snapshot!(format_sessions(&[]), @"No sessions in this window.");
    }

    #[test]
    fn test_sessions_table() {
        let user = UserId::new("local").unwrap();
        let pulses = vec![
            pulse("vscode", 0, Some("api")),
            pulse("vscode", 5, Some("api")),
            pulse("vscode", 12, Some("api")),
            // 30 minute gap
            pulse("vscode", 42, Some("api")),
            pulse("claude-code", 43, None),
        ];
        let sessions = group_into_sessions(&pulses, &user, 900_000);

        assert_snapshot!(format_sessions(&sessions), @r"
SESSIONS: 3 (12m total)

START (UTC)       DURATION  PULSES  TOOL            PROJECT
2025-01-15 10:00       12m       3  vscode          api
2025-01-15 10:42        0m       1  vscode          api
2025-01-15 10:43        0m       1  claude-code     -
");
    }
}
