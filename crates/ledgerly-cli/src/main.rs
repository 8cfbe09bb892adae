//! Ledgerly CLI - Command-line interface for Ledgerly
//!
//! Provides commands for:
//! - Recording, editing and removing expenses (online-first with offline
//!   fallback)
//! - Listing the merged remote + local expense view
//! - Triggering and watching background sync
//! - Inspecting pending offline state

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    add::AddCommand, clear::ClearCommand, edit::EditCommand, list::ListCommand,
    remove::RemoveCommand, status::StatusCommand, sync::SyncCommand, watch::WatchCommand,
};
use ledgerly_core::config::Config;

#[derive(Debug, Parser)]
#[command(name = "ledgerly", version, about = "Offline-first expense tracker")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Record a new expense
    Add(AddCommand),
    /// List expenses for a month (remote rows plus unsynced local records)
    List(ListCommand),
    /// Amend an existing expense
    Edit(EditCommand),
    /// Delete an expense
    Remove(RemoveCommand),
    /// Push pending offline state to the remote store
    Sync(SyncCommand),
    /// Show connectivity and pending offline counts
    Status(StatusCommand),
    /// Run the periodic background sync loop
    Watch(WatchCommand),
    /// Wipe locally stored offline data
    Clear(ClearCommand),
}

/// Picks the default tracing filter: the configured `logging.level` unless
/// `--verbose` asks for more (`RUST_LOG` overrides both)
fn log_filter(verbose: u8, configured: &str) -> String {
    match verbose {
        0 => configured.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

fn init_tracing(config: &Config, verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_filter(verbose, &config.logging.level)));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if let Some(path) = config.logging.file.as_ref() {
        match std::fs::OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                builder.with_ansi(false).with_writer(Mutex::new(file)).init();
                return;
            }
            Err(err) => {
                eprintln!("warning: cannot open log file {}: {err}", path.display());
            }
        }
    }
    // Logs go to stderr so `--json` output on stdout stays parseable
    builder.with_writer(std::io::stderr).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .as_deref()
        .map(PathBuf::from)
        .unwrap_or_else(Config::default_path);
    let config = Config::load_or_default(&config_path);
    init_tracing(&config, cli.verbose);

    match cli.command {
        Commands::Add(cmd) => cmd.execute(cli.config.as_deref(), cli.json).await,
        Commands::List(cmd) => cmd.execute(cli.config.as_deref(), cli.json).await,
        Commands::Edit(cmd) => cmd.execute(cli.config.as_deref(), cli.json).await,
        Commands::Remove(cmd) => cmd.execute(cli.config.as_deref(), cli.json).await,
        Commands::Sync(cmd) => cmd.execute(cli.config.as_deref(), cli.json).await,
        Commands::Status(cmd) => cmd.execute(cli.config.as_deref(), cli.json).await,
        Commands::Watch(cmd) => cmd.execute(cli.config.as_deref(), cli.json).await,
        Commands::Clear(cmd) => cmd.execute(cli.config.as_deref(), cli.json).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_defaults_to_configured_level() {
        assert_eq!(log_filter(0, "warn"), "warn");
        assert_eq!(log_filter(0, "info"), "info");
    }

    #[test]
    fn test_log_filter_verbose_escalates() {
        assert_eq!(log_filter(1, "warn"), "debug");
        assert_eq!(log_filter(2, "warn"), "trace");
        assert_eq!(log_filter(5, "info"), "trace");
    }
}
