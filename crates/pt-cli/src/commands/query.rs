//! Pulse lookup shared by `pt stats` and `pt sessions`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use pt_core::{Pulse, UserId, Window};
use pt_db::{MemoryStore, PulseFilters, PulseStore};

use super::util::{open_database, read_pulse_file, resolve_window};
use crate::Config;
use crate::cli::QueryArgs;

const MS_PER_DAY: i64 = 86_400_000;

/// A resolved query: who, when and which pulses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub user: UserId,
    pub window: Window,
    pub filters: PulseFilters,
}

impl Query {
    pub fn from_args(args: &QueryArgs, config: &Config, now: DateTime<Utc>) -> Result<Self> {
        let user = config
            .user(args.user.as_deref())
            .context("invalid user id")?;
        let window = resolve_window(args, now)?;
        let filters = PulseFilters {
            project: args.project.clone(),
            tool: args.tool.clone(),
        };
        Ok(Self {
            user,
            window,
            filters,
        })
    }

    /// Runs the query against any store.
    pub fn fetch(&self, store: &dyn PulseStore) -> Result<Vec<Pulse>> {
        let pulses = store
            .query_window(&self.user, self.window, &self.filters)
            .with_context(|| format!("failed to query {} store", store.dialect()))?;
        tracing::debug!(
            user = %self.user,
            dialect = %store.dialect(),
            count = pulses.len(),
            "fetched pulses"
        );
        Ok(pulses)
    }
}

/// Opens the store named by the arguments: a pulse file loaded into memory,
/// or the configured database.
///
/// File pulses are retained relative to the end of the query window, for at
/// least the length of the window, so nothing inside it is evicted.
pub fn open_store(args: &QueryArgs, config: &Config, query: &Query) -> Result<Box<dyn PulseStore>> {
    let Some(path) = &args.file else {
        return Ok(Box::new(open_database(config)?));
    };

    let pulses = read_pulse_file(path)?;
    let anchor = DateTime::from_timestamp_millis(query.window.end_ms).unwrap_or_else(Utc::now);
    let retention_days = config.retention_days.max(window_days(query.window));
    let mut store = MemoryStore::with_retention_days(retention_days);
    store.store_for_user_at(&query.user, &pulses, anchor);
    Ok(Box::new(store))
}

/// Whole days strictly covering a window, so `end - days` falls before `start`.
fn window_days(window: Window) -> i64 {
    window
        .end_ms
        .saturating_sub(window.start_ms)
        .max(0)
        .div_euclid(MS_PER_DAY)
        .saturating_add(1)
}

/// Resolves the query, opens the store and fetches pulses.
pub fn load(args: &QueryArgs, config: &Config, now: DateTime<Utc>) -> Result<(Query, Vec<Pulse>)> {
    let query = Query::from_args(args, config, now)?;
    let store = open_store(args, config, &query)?;
    let pulses = query.fetch(store.as_ref())?;
    Ok((query, pulses))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    use chrono::TimeZone;

    fn config_in(dir: &std::path::Path) -> Config {
        Config {
            database_path: dir.join("pt.db"),
            ..Config::default()
        }
    }

    #[test]
    fn test_file_source_applies_window_and_filters() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("pulses.jsonl");
        let mut file = std::fs::File::create(&path).unwrap();
        // 2025-01-15T10:00:00Z, 10:01, and one from a month earlier.
        writeln!(file, r#"{{"tool":"vscode","timestamp":1736935200000,"activity_type":"coding","project":"api"}}"#).unwrap();
        writeln!(file, r#"{{"tool":"vscode","timestamp":1736935260000,"activity_type":"coding","project":"web"}}"#).unwrap();
        writeln!(file, r#"{{"tool":"vscode","timestamp":1734343200000,"activity_type":"coding","project":"api"}}"#).unwrap();

        let args = QueryArgs {
            project: Some("api".to_string()),
            file: Some(path),
            ..QueryArgs::default()
        };
        let now = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();

        let (query, pulses) = load(&args, &config_in(temp.path()), now).unwrap();

        assert_eq!(query.user.as_str(), "local");
        assert_eq!(pulses.len(), 1);
        assert_eq!(pulses[0].timestamp, 1_736_935_200_000);
        // Nothing was written to the database.
        assert!(!temp.path().join("pt.db").exists());
    }

    #[test]
    fn test_database_source_is_created_on_demand() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            database_path: temp.path().join("nested").join("pt.db"),
            ..Config::default()
        };
        let now = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();

        let (_, pulses) = load(&QueryArgs::default(), &config, now).unwrap();

        assert!(pulses.is_empty());
        assert!(config.database_path.exists());
    }

    #[test]
    fn test_invalid_user_is_rejected() {
        let args = QueryArgs {
            user: Some("   ".to_string()),
            ..QueryArgs::default()
        };
        let now = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();
        assert!(Query::from_args(&args, &Config::default(), now).is_err());
    }

    #[test]
    fn test_file_source_keeps_pulses_across_long_window() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("pulses.jsonl");
        let mut file = std::fs::File::create(&path).unwrap();
        // 2025-01-01T10:00:00Z and 10:01, thirty days before the window end.
        writeln!(file, r#"{{"tool":"vscode","timestamp":1735725600000,"activity_type":"coding"}}"#).unwrap();
        writeln!(file, r#"{{"tool":"vscode","timestamp":1735725660000,"activity_type":"coding"}}"#).unwrap();

        let args = QueryArgs {
            start: Some("2024-12-31".to_string()),
            end: Some("2025-01-31T00:00:00Z".to_string()),
            file: Some(path),
            ..QueryArgs::default()
        };
        let now = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();

        let (_, pulses) = load(&args, &config_in(temp.path()), now).unwrap();

        assert_eq!(pulses.len(), 2);
    }

    #[test]
    fn test_window_days_covers_the_window() {
        assert_eq!(window_days(Window::new(0, 0)), 1);
        assert_eq!(window_days(Window::new(0, MS_PER_DAY - 1)), 1);
        assert_eq!(window_days(Window::new(0, 31 * MS_PER_DAY)), 32);
        assert_eq!(window_days(Window::new(10, 0)), 1);
        assert_eq!(window_days(Window::new(i64::MIN, i64::MAX)), i64::MAX / MS_PER_DAY + 1);
    }
}
