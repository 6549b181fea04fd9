//! CLI command definitions and execution
//!
//! Every command takes one `s3://…` or `sftp://…` URI (plus a local path
//! for the transfer commands) and drives the shared file-reference
//! interface; nothing here is backend-specific.

use clap::{Parser, Subcommand};

use fr_core::{Config, ConfigManager};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};
use crate::remote::RemoteRef;

mod completions;
mod find;
mod get;
mod ls;
mod mkdir;
mod put;
mod rm;
mod stat;

/// fref - backend-agnostic file references
///
/// Navigate, inspect, and transfer files across object storage and
/// SFTP-reachable hosts through one interface.
#[derive(Parser, Debug)]
#[command(name = "fref")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the immediate children of a directory reference
    Ls(ls::LsArgs),

    /// Depth-first search for files by name prefix
    Find(find::FindArgs),

    /// Show existence and kind of a reference
    Stat(stat::StatArgs),

    /// Download a remote file to a local path
    Get(get::GetArgs),

    /// Upload a local file to a remote path
    Put(put::PutArgs),

    /// Remove a file or directory
    Rm(rm::RmArgs),

    /// Create a directory and its missing ancestors
    Mkdir(mkdir::MkdirArgs),

    /// Generate shell completion scripts
    Completions(completions::CompletionsArgs),
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Ls(args) => ls::execute(args, output_config).await,
        Commands::Find(args) => find::execute(args, output_config).await,
        Commands::Stat(args) => stat::execute(args, output_config).await,
        Commands::Get(args) => get::execute(args, output_config).await,
        Commands::Put(args) => put::execute(args, output_config).await,
        Commands::Rm(args) => rm::execute(args, output_config).await,
        Commands::Mkdir(args) => mkdir::execute(args, output_config).await,
        Commands::Completions(args) => completions::execute(args),
    }
}

/// Load the shared configuration, honoring the FREF_CONFIG override
/// (used by tests and automation to point at a non-default file).
pub(crate) fn load_config() -> fr_core::Result<Config> {
    let manager = match std::env::var("FREF_CONFIG") {
        Ok(path) => ConfigManager::with_path(path.into()),
        Err(_) => ConfigManager::new()?,
    };
    manager.load()
}

/// Shared command preamble: configuration plus URI routing, with the
/// failure already reported and mapped to an exit code.
pub(crate) fn load_remote(
    uri: &str,
    formatter: &Formatter,
) -> std::result::Result<RemoteRef, ExitCode> {
    let config = match load_config() {
        Ok(c) => c,
        Err(e) => {
            formatter.error(&format!("Failed to load configuration: {e}"));
            return Err(ExitCode::UsageError);
        }
    };

    match RemoteRef::parse(uri, &config) {
        Ok(remote) => Ok(remote),
        Err(e) => {
            formatter.error(&e.to_string());
            Err(ExitCode::from_error(&e))
        }
    }
}
