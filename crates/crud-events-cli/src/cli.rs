use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "crud-events")]
#[command(about = "Register message schemas and inspect CRUD event settings")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to ./crud-events.toml when present)
    #[arg(short, long, global = true, env = "CRUD_EVENTS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level filter; RUST_LOG takes precedence
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,
}

#[derive(Clone, Copy, ValueEnum, Default, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register a message schema with the registry
    Register(RegisterArgs),
    /// Inspect configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct RegisterArgs {
    /// Package the message belongs to
    #[arg(short, long)]
    pub package: String,
    /// Message name
    #[arg(short, long)]
    pub message: String,
    /// Schema file to upload
    #[arg(long)]
    pub file: PathBuf,
    /// Application id (overrides events.application_id)
    #[arg(short, long)]
    pub application_id: Option<String>,
    /// Registry base URL (overrides registry.address)
    #[arg(long)]
    pub registry: Option<String>,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
}
