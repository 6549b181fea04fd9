//! rm command - Remove a file or directory
//!
//! Directory removal is backend-dependent: object storage removes the
//! whole key prefix, SFTP only empty directories.

use clap::Args;
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Remove a file or directory
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Reference URI (s3://bucket/path or sftp://host/path)
    pub uri: String,
}

#[derive(Debug, Serialize)]
struct RmOutput {
    uri: String,
    removed: bool,
}

/// Execute the rm command
pub async fn execute(args: RmArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let remote = match super::load_remote(&args.uri, &formatter) {
        Ok(r) => r,
        Err(code) => return code,
    };

    let removed = match remote.delete().await {
        Ok(removed) => removed,
        Err(e) => {
            formatter.error(&format!("Failed to remove {}: {e}", remote.uri()));
            return ExitCode::from_error(&e);
        }
    };

    if formatter.is_json() {
        formatter.json(&RmOutput {
            uri: remote.uri(),
            removed,
        });
    } else if removed {
        formatter.success(&format!("Removed {}", remote.uri()));
    } else {
        formatter.warning(&format!("Nothing to remove at {}", remote.uri()));
    }

    if removed {
        ExitCode::Success
    } else {
        ExitCode::NotFound
    }
}
