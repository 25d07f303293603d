mod cli;
mod commands;
mod observability;
mod output;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Commands, ConfigCommands};
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.format.unwrap_or_default();

    let mut cfg =
        crud_events::read_config(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(level) = &cli.log_level {
        cfg.logging.level = level.clone();
    }
    observability::init_tracing_with_level(&cfg.logging.level);

    match &cli.command {
        Commands::Register(args) => {
            if let Some(application_id) = &args.application_id {
                cfg.events.application_id = application_id.clone();
            }
            if let Some(registry) = &args.registry {
                cfg.registry.address = registry.clone();
            }
            cfg.validate().context("Invalid configuration")?;
            commands::register::register(&cfg, args, format).await?;
        }
        Commands::Config(args) => match &args.command {
            ConfigCommands::Show => {
                commands::config::show(&cfg, format);
            }
        },
    }

    Ok(())
}
