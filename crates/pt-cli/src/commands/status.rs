//! Status command for showing recent activity by tool.

use std::io::Write;

use anyhow::{Context, Result};

use super::util::{format_ms, open_database};
use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let user = config.user(None).context("invalid user id")?;
    let db = open_database(config)?;
    let tools = db.last_pulse_times_by_tool(&user)?;

    writeln!(writer, "Pulse tracker status")?;
    writeln!(writer, "Database: {}", config.database_path.display())?;
    writeln!(writer, "User: {user}")?;

    if tools.is_empty() {
        writeln!(writer, "No pulses recorded.")?;
        return Ok(());
    }

    writeln!(writer, "Tools:")?;
    for tool in tools {
        writeln!(
            writer,
            "- {}: {} ({} pulses)",
            tool.tool,
            format_ms(tool.last_pulse_ms),
            tool.pulse_count
        )?;
    }

    Ok(())
}
