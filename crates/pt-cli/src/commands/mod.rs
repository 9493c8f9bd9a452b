//! CLI subcommand implementations.

pub mod ingest;
pub mod prune;
pub mod query;
pub mod report;
pub mod sessions;
pub mod status;
pub mod util;
