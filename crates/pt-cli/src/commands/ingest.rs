//! Ingest command: stores JSON-lines pulses from stdin.

use std::io::{self, BufRead};

use anyhow::{Context, Result};
use pt_core::validate_batch;
use pt_db::PulseStore;

use super::util::{open_database, parse_pulses};
use crate::Config;

/// Reads, validates and stores one batch. Returns the number stored.
///
/// The whole batch is rejected if any line is invalid or if it is empty.
pub fn ingest<R: BufRead>(
    reader: R,
    store: &mut dyn PulseStore,
    config: &Config,
    user: Option<&str>,
) -> Result<usize> {
    let user = config.user(user).context("invalid user id")?;
    let pulses = parse_pulses(reader)?;
    validate_batch(&pulses).context("no pulses to ingest")?;

    let stored = store
        .store_for_user(&user, &pulses)
        .with_context(|| format!("failed to store pulses in {} store", store.dialect()))?;
    tracing::info!(user = %user, stored, "ingested pulses");
    Ok(stored)
}

pub fn run(config: &Config, user: Option<&str>) -> Result<usize> {
    let mut db = open_database(config)?;
    let stdin = io::stdin();
    ingest(stdin.lock(), &mut db, config, user)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    use pt_core::{UserId, Window};
    use pt_db::{Database, MemoryStore, PulseFilters};

    const INPUT: &str = "\
{\"tool\":\"vscode\",\"timestamp\":1736935200000,\"activity_type\":\"coding\",\"project\":\"api\",\"is_write\":true}
{\"tool\":\"vscode\",\"timestamp\":1736935260000,\"activity_type\":\"coding\",\"project\":\"api\"}
";

    #[test]
    fn ingest_stores_batch_for_configured_user() {
        let mut db = Database::open_in_memory().unwrap();
        let config = Config::default();

        let stored = ingest(Cursor::new(INPUT), &mut db, &config, None).unwrap();
        assert_eq!(stored, 2);

        let pulses = db
            .query_window(
                &UserId::new("local").unwrap(),
                Window::new(0, i64::MAX),
                &PulseFilters::default(),
            )
            .unwrap();
        assert_eq!(pulses.len(), 2);
        assert!(pulses[0].is_write);
    }

    #[test]
    fn ingest_honors_user_override() {
        let mut db = Database::open_in_memory().unwrap();
        ingest(Cursor::new(INPUT), &mut db, &Config::default(), Some("sam")).unwrap();

        let sam = db
            .query_window(
                &UserId::new("sam").unwrap(),
                Window::new(0, i64::MAX),
                &PulseFilters::default(),
            )
            .unwrap();
        assert_eq!(sam.len(), 2);
    }

    #[test]
    fn ingest_rejects_empty_batch() {
        let mut store = MemoryStore::new();
        let err = ingest(Cursor::new("\n\n"), &mut store, &Config::default(), None).unwrap_err();
        assert_eq!(err.to_string(), "no pulses to ingest");
    }

    #[test]
    fn ingest_rejects_whole_batch_on_bad_line() {
        let mut db = Database::open_in_memory().unwrap();
        let input = format!("{INPUT}{{\"tool\":\"\",\"timestamp\":1736935320000,\"activity_type\":\"coding\"}}\n");

        let err = ingest(Cursor::new(input), &mut db, &Config::default(), None).unwrap_err();
        assert_eq!(err.to_string(), "invalid pulse on line 3");

        let pulses = db
            .query_window(
                &UserId::new("local").unwrap(),
                Window::new(0, i64::MAX),
                &PulseFilters::default(),
            )
            .unwrap();
        assert!(pulses.is_empty());
    }
}
