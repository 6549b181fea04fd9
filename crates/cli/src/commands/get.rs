//! get command - Download a remote file
//!
//! Safe by default: the content lands in a `.tmp` sibling and is renamed
//! onto the destination only after the transfer, so the destination is
//! never left partially written. `--direct` writes the destination
//! in place and may leave a partial file on failure.

use clap::Args;
use serde::Serialize;

use fr_core::LocalFileRef;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Download a remote file to a local path
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Source reference URI (s3://bucket/path or sftp://host/path)
    pub uri: String,

    /// Local destination path
    pub target: String,

    /// Write the destination directly instead of via a temporary file
    #[arg(long)]
    pub direct: bool,
}

#[derive(Debug, Serialize)]
struct GetOutput {
    status: &'static str,
    source: String,
    target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_human: Option<String>,
}

/// Execute the get command
pub async fn execute(args: GetArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let remote = match super::load_remote(&args.uri, &formatter) {
        Ok(r) => r,
        Err(code) => return code,
    };

    let target = LocalFileRef::new(&args.target);
    match remote.download(&target, !args.direct).await {
        Ok(true) => {
            let size = target.size().await.ok();
            if formatter.is_json() {
                formatter.json(&GetOutput {
                    status: "success",
                    source: remote.uri(),
                    target: args.target.clone(),
                    size_bytes: size,
                    size_human: size.map(|s| humansize::format_size(s, humansize::BINARY)),
                });
            } else {
                formatter.println(&format!(
                    "{} -> {} ({})",
                    remote.uri(),
                    args.target,
                    size.map(|s| humansize::format_size(s, humansize::BINARY))
                        .unwrap_or_default()
                ));
            }
            ExitCode::Success
        }
        Ok(false) => {
            formatter.error(&format!(
                "Download of {} did not complete",
                remote.uri()
            ));
            ExitCode::GeneralError
        }
        Err(e) => {
            formatter.error(&format!("Failed to download {}: {e}", remote.uri()));
            ExitCode::from_error(&e)
        }
    }
}
