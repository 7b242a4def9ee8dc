//! Ravel CLI entry point.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use ravel::cli::commands::campaign::{self, CampaignPlan};
use ravel::cli::commands::{display, memo};
use ravel::cli::{Cli, Commands};
use ravel::infrastructure::config::ConfigLoader;
use ravel::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli.command, cli.config.as_deref(), cli.verbose, cli.json).await {
        Ok(code) => code,
        Err(err) => ravel::cli::handle_error(err, cli.json),
    }
}

async fn run(
    command: Commands,
    config_path: Option<&std::path::Path>,
    verbose: u8,
    json: bool,
) -> Result<ExitCode> {
    let config = match config_path {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };

    // Held until exit so the file writer flushes.
    let _logger = LoggerImpl::init(&LogConfig::from_settings(&config.logging).with_verbosity(verbose))?;

    let plan = match command {
        Commands::Native(args) => CampaignPlan::Native(args),
        Commands::Profile(args) => CampaignPlan::Profile(args),
        Commands::Active(args) => CampaignPlan::Active(args),
        Commands::Race(args) => CampaignPlan::Race(args),
        Commands::Chess(args) => CampaignPlan::Chess(args),
        Commands::Random(args) => CampaignPlan::Random(args),
        Commands::Idiom(args) => CampaignPlan::Idiom(args),
        Commands::ChessRace(args) => CampaignPlan::ChessRace(args),
        Commands::Memo(args) => {
            memo::execute(args, &config, json).await?;
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Display(args) => {
            display::execute(args, &config, json).await?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    campaign::execute(plan, &config, json).await
}
