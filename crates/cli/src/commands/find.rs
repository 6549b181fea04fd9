//! find command - Search files by name prefix
//!
//! Walks the subtree depth-first and prints matching files.

use clap::Args;
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Depth-first search for files by name prefix
#[derive(Args, Debug)]
pub struct FindArgs {
    /// Root reference URI (s3://bucket/path or sftp://host/path)
    pub uri: String,

    /// Name prefix; empty matches every file
    #[arg(default_value = "")]
    pub prefix: String,
}

#[derive(Debug, Serialize)]
struct FindOutput {
    uri: String,
    prefix: String,
    matches: Vec<String>,
}

/// Execute the find command
pub async fn execute(args: FindArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let remote = match super::load_remote(&args.uri, &formatter) {
        Ok(r) => r,
        Err(code) => return code,
    };

    let matches = remote.find_file_uris(&args.prefix).await;

    if formatter.is_json() {
        formatter.json(&FindOutput {
            uri: remote.uri(),
            prefix: args.prefix,
            matches,
        });
    } else {
        for found in &matches {
            formatter.println(found);
        }
        if matches.is_empty() {
            formatter.warning("No matches.");
        }
    }

    ExitCode::Success
}
