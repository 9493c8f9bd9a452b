//! In-memory pulse store with a rolling retention window.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use pt_core::{Pulse, UserId};

use crate::{DbError, Dialect, PulseFilters, PulseStore, retention_cutoff_ms};

/// Pulses older than this many days are evicted on write.
pub const DEFAULT_RETENTION_DAYS: i64 = 7;

/// A pulse as held by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPulse {
    /// `<user_id>-<timestamp>-<index in batch>`.
    pub id: String,
    pub user_id: UserId,
    pub pulse: Pulse,
}

/// Owned, per-user pulse map.
///
/// Every write drops that user's pulses with
/// `timestamp <= now - retention`. Nothing is shared between instances.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    pulses: HashMap<UserId, Vec<StoredPulse>>,
    retention_days: i64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty store with the default retention.
    pub fn new() -> Self {
        Self::with_retention_days(DEFAULT_RETENTION_DAYS)
    }

    /// Creates an empty store keeping `days` of pulses. Retention too long
    /// to represent keeps everything.
    pub fn with_retention_days(days: i64) -> Self {
        Self {
            pulses: HashMap::new(),
            retention_days: days,
        }
    }

    /// Stores pulses and evicts expired ones relative to `now`.
    pub fn store_for_user_at(
        &mut self,
        user_id: &UserId,
        pulses: &[Pulse],
        now: DateTime<Utc>,
    ) -> usize {
        let stored = self.pulses.entry(user_id.clone()).or_default();
        stored.extend(pulses.iter().enumerate().map(|(i, pulse)| StoredPulse {
            id: format!("{user_id}-{}-{i}", pulse.timestamp),
            user_id: user_id.clone(),
            pulse: pulse.clone(),
        }));

        let cutoff_ms = retention_cutoff_ms(now, self.retention_days);
        let before = stored.len();
        stored.retain(|s| s.pulse.timestamp > cutoff_ms);
        let evicted = before - stored.len();

        tracing::debug!(
            user = %user_id,
            added = pulses.len(),
            evicted,
            held = stored.len(),
            "stored pulses in memory"
        );
        pulses.len()
    }

    /// Pulses currently held for a user, in insertion order.
    pub fn stored_for(&self, user_id: &UserId) -> &[StoredPulse] {
        self.pulses
            .get(user_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Drops everything.
    pub fn clear(&mut self) {
        self.pulses.clear();
    }
}

impl PulseStore for MemoryStore {
    fn dialect(&self) -> Dialect {
        Dialect::Memory
    }

    fn store_for_user(&mut self, user_id: &UserId, pulses: &[Pulse]) -> Result<usize, DbError> {
        Ok(self.store_for_user_at(user_id, pulses, Utc::now()))
    }

    fn query_by_user_and_window(
        &self,
        user_id: &UserId,
        start_ms: i64,
        end_ms: i64,
        filters: &PulseFilters,
    ) -> Result<Vec<Pulse>, DbError> {
        Ok(self
            .stored_for(user_id)
            .iter()
            .map(|s| &s.pulse)
            .filter(|p| p.timestamp >= start_ms && p.timestamp <= end_ms)
            .filter(|p| filters.matches(p))
            .cloned()
            .collect())
    }
}
