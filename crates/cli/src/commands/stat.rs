//! stat command - Show reference state
//!
//! Round-trips to the backend for existence and kind; nothing is cached.

use clap::Args;
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Show existence and kind of a reference
#[derive(Args, Debug)]
pub struct StatArgs {
    /// Reference URI (s3://bucket/path or sftp://host/path)
    pub uri: String,
}

#[derive(Debug, Serialize)]
struct StatOutput {
    uri: String,
    name: String,
    exists: bool,
    directory: bool,
}

/// Execute the stat command
pub async fn execute(args: StatArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let remote = match super::load_remote(&args.uri, &formatter) {
        Ok(r) => r,
        Err(code) => return code,
    };

    let exists = match remote.exists().await {
        Ok(exists) => exists,
        Err(e) => {
            formatter.error(&format!("Failed to stat {}: {e}", remote.uri()));
            return ExitCode::from_error(&e);
        }
    };
    let directory = match remote.is_directory().await {
        Ok(directory) => directory,
        Err(e) => {
            formatter.error(&format!("Failed to stat {}: {e}", remote.uri()));
            return ExitCode::from_error(&e);
        }
    };

    let output = StatOutput {
        uri: remote.uri(),
        name: remote.name(),
        exists,
        directory,
    };

    if formatter.is_json() {
        formatter.json(&output);
    } else {
        let kind = if output.directory {
            "directory"
        } else if output.exists {
            "file"
        } else {
            "absent"
        };
        formatter.println(&format!("{} {}", output.uri, kind));
    }

    if exists {
        ExitCode::Success
    } else {
        ExitCode::NotFound
    }
}
