//! Pulse tracker CLI library.
//!
//! This crate provides the `pt` command-line interface over `pt-core` and `pt-db`.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, QueryArgs};
pub use config::Config;
