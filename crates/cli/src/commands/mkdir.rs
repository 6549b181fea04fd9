//! mkdir command - Create a directory
//!
//! Idempotent: succeeds whether the directory already existed or was
//! just created. Object storage has implicit directories, so there the
//! command is a no-op that still reports success.

use clap::Args;
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Create a directory and its missing ancestors
#[derive(Args, Debug)]
pub struct MkdirArgs {
    /// Reference URI (s3://bucket/path or sftp://host/path)
    pub uri: String,
}

#[derive(Debug, Serialize)]
struct MkdirOutput {
    uri: String,
    created: bool,
}

/// Execute the mkdir command
pub async fn execute(args: MkdirArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let remote = match super::load_remote(&args.uri, &formatter) {
        Ok(r) => r,
        Err(code) => return code,
    };

    let created = match remote.mkdirs().await {
        Ok(created) => created,
        Err(e) => {
            formatter.error(&format!("Failed to create {}: {e}", remote.uri()));
            return ExitCode::from_error(&e);
        }
    };

    if formatter.is_json() {
        formatter.json(&MkdirOutput {
            uri: remote.uri(),
            created,
        });
    } else if created {
        formatter.success(&format!("Created {}", remote.uri()));
    } else {
        formatter.error(&format!("Could not create {}", remote.uri()));
    }

    if created {
        ExitCode::Success
    } else {
        ExitCode::NetworkError
    }
}
