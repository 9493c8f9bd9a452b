//! Prune command: drops pulses past the retention window.

use anyhow::Result;
use chrono::{DateTime, Utc};
use pt_db::{Database, retention_cutoff_ms};

use super::util::{format_ms, open_database};
use crate::Config;

/// Deletes pulses with `timestamp <= now - days`. Returns rows removed and the cutoff.
///
/// A retention longer than chrono can represent removes nothing.
pub fn prune(db: &mut Database, days: i64, now: DateTime<Utc>) -> Result<(usize, i64)> {
    let cutoff_ms = retention_cutoff_ms(now, days);
    let removed = db.prune_older_than(cutoff_ms)?;
    Ok((removed, cutoff_ms))
}

pub fn run(config: &Config, days: Option<u32>) -> Result<()> {
    let days = days.map_or(config.retention_days, i64::from);
    let mut db = open_database(config)?;
    let (removed, cutoff_ms) = prune(&mut db, days, Utc::now())?;
    tracing::info!(removed, cutoff_ms, "pruned pulses");
    println!("Removed {removed} pulses up to {}", format_ms(cutoff_ms));
    Ok(())
}
