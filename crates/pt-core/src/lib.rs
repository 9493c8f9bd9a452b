//! Core domain logic for the pulse time tracker.
//!
//! This crate turns discrete activity pulses into working time:
//! - Session grouping: contiguous runs of pulses per tool and project
//! - Aggregation: totals by tool, project and language
//! - Day buckets: a zero-filled per-UTC-day series over a window
//!
//! Everything here is pure and synchronous; storage lives in `pt-db`.

pub mod activity;
mod aggregate;
pub mod pulse;
mod session;
pub mod types;
pub mod window;

pub use activity::ActivityType;
pub use aggregate::{
    AggregateResult, AggregationConfig, DEFAULT_GAP_THRESHOLD_MS, DayStats, StatsSummary,
    aggregate_by_day, aggregate_stats, summarize,
};
pub use pulse::{Pulse, Timestamped, validate_batch};
pub use session::{Session, group_into_sessions};
pub use types::{UserId, ValidationError};
pub use window::{Range, Window};
