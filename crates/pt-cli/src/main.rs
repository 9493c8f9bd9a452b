use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pt_cli::commands::{ingest, prune, report, sessions, status};
use pt_cli::{Cli, Commands, Config};

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr, command output to stdout
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    match &cli.command {
        Some(Commands::Ingest { user }) => {
            let config = load_config(cli.config.as_deref())?;
            let stored = ingest::run(&config, user.as_deref())?;
            println!("Stored {stored} pulses");
        }
        Some(Commands::Stats(args)) => {
            let config = load_config(cli.config.as_deref())?;
            report::run(args, &config)?;
        }
        Some(Commands::Sessions(args)) => {
            let config = load_config(cli.config.as_deref())?;
            sessions::run(args, &config)?;
        }
        Some(Commands::Status) => {
            let config = load_config(cli.config.as_deref())?;
            status::run(&mut std::io::stdout(), &config)?;
        }
        Some(Commands::Prune { days }) => {
            let config = load_config(cli.config.as_deref())?;
            prune::run(&config, *days)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
