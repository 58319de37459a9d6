use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use trail_cli::commands::{export, report};
use trail_cli::{Cli, Commands, Config};

/// Loads config and applies command-line overrides.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(minutes) = cli.idle_minutes {
        config.idle_threshold_minutes = minutes;
    }
    if let Some(timezone) = &cli.timezone {
        config.timezone.clone_from(timezone);
    }
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so CSV and JSON on stdout stay clean
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Some(Commands::Report { file, top, json }) => {
            let config = load_config(&cli)?;
            report::run(&mut out, &config, file, *top, *json)?;
        }
        Some(Commands::Export { table }) => {
            let config = load_config(&cli)?;
            export::run(&mut out, &config, table)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    out.flush()?;
    Ok(())
}
