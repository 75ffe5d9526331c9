/// Offline harness: reads JSON inputs, runs the core, prints JSON results.
/// Logs go to stderr; stdout carries only the JSON output.
mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::Session;

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let ctx = Session::load(cli.config.as_deref(), cli.references.as_deref())?;

    match cli.command {
        Commands::Scores(args) => commands::scores(&ctx, args),
        Commands::Stats(args) => commands::stats(&ctx, args),
        Commands::Trend(args) => commands::trend(&ctx, args),
        Commands::Zones(args) => commands::zones(&ctx, args),
        Commands::Fingerprint(args) => commands::fingerprint(&ctx, args),
        Commands::Match(args) => commands::matches(&ctx, args),
        Commands::Audit(args) => commands::audit(&ctx, args),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
