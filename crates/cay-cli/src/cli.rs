use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "cay",
    about = "Cayenne data map tools",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Add missing attributes and relationships to object entities
    Sync(SyncArgs),
    /// Show what a sync would change, without changing anything
    Diff(DiffArgs),
    /// List object entities and the tables they are mapped to
    Entities(EntitiesArgs),
    /// Print the default sync policy as TOML
    DefaultConfig,
}

#[derive(Args)]
pub struct SyncArgs {
    /// Data map file (JSON)
    pub map: PathBuf,
    /// Policy file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Entities to synchronize; all when omitted
    #[arg(short, long = "entity")]
    pub entities: Vec<String>,
    /// Write the updated map here instead of back to MAP
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Report changes without writing the map
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct DiffArgs {
    pub map: PathBuf,
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[arg(short, long = "entity")]
    pub entities: Vec<String>,
}

#[derive(Args)]
pub struct EntitiesArgs {
    pub map: PathBuf,
}
