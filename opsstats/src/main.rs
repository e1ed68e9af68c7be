use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use opsstats::commands;
use opsstats::{Cli, Command, Config};
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Load config and apply CLI overrides
    let mut config = Config::load_from(cli.config.as_deref())?;
    cli.apply_to_config(&mut config);
    debug!(?config, "Configuration loaded");

    let use_colors = !cli.no_color;
    let mut out = std::io::stdout().lock();
    let code = match &cli.command {
        Command::Reviews(args) => {
            commands::run_reviews(args, &config, use_colors, &mut out).await?
        }
        Command::Summary(args) => {
            commands::run_summary(args, &config, use_colors, &mut out).await?
        }
        Command::Compare(args) => commands::run_compare(args, &config, use_colors, &mut out)?,
    };

    Ok(ExitCode::from(code))
}
