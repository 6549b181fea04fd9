//! ls command - List children
//!
//! Lists the immediate children of a directory reference. A reference
//! that is not a directory lists as empty.

use clap::Args;
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// List the immediate children of a reference
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Reference URI (s3://bucket/path or sftp://host/path)
    pub uri: String,
}

#[derive(Debug, Serialize)]
struct LsOutput {
    uri: String,
    entries: Vec<String>,
}

/// Execute the ls command
pub async fn execute(args: LsArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let remote = match super::load_remote(&args.uri, &formatter) {
        Ok(r) => r,
        Err(code) => return code,
    };

    let entries = match remote.list_uris().await {
        Ok(entries) => entries,
        Err(e) => {
            formatter.error(&format!("Failed to list {}: {e}", remote.uri()));
            return ExitCode::from_error(&e);
        }
    };

    if formatter.is_json() {
        formatter.json(&LsOutput {
            uri: remote.uri(),
            entries,
        });
    } else {
        for entry in &entries {
            formatter.println(entry);
        }
        if entries.is_empty() {
            formatter.warning("No entries.");
        }
    }

    ExitCode::Success
}
