//! put command - Upload a local file
//!
//! Whole-file upload; fails fast when either side is a directory.

use clap::Args;
use serde::Serialize;

use fr_core::LocalFileRef;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Upload a local file to a remote path
#[derive(Args, Debug)]
pub struct PutArgs {
    /// Local source path
    pub source: String,

    /// Destination reference URI (s3://bucket/path or sftp://host/path)
    pub uri: String,
}

#[derive(Debug, Serialize)]
struct PutOutput {
    status: &'static str,
    source: String,
    target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_human: Option<String>,
}

/// Execute the put command
pub async fn execute(args: PutArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let remote = match super::load_remote(&args.uri, &formatter) {
        Ok(r) => r,
        Err(code) => return code,
    };

    let source = LocalFileRef::new(&args.source);
    let size = source.size().await.ok();

    match remote.upload(&source).await {
        Ok(true) => {
            if formatter.is_json() {
                formatter.json(&PutOutput {
                    status: "success",
                    source: args.source.clone(),
                    target: remote.uri(),
                    size_bytes: size,
                    size_human: size.map(|s| humansize::format_size(s, humansize::BINARY)),
                });
            } else {
                formatter.println(&format!(
                    "{} -> {} ({})",
                    args.source,
                    remote.uri(),
                    size.map(|s| humansize::format_size(s, humansize::BINARY))
                        .unwrap_or_default()
                ));
            }
            ExitCode::Success
        }
        Ok(false) => {
            formatter.error(&format!(
                "Upload of {} to {} did not complete",
                args.source,
                remote.uri()
            ));
            ExitCode::GeneralError
        }
        Err(e) => {
            formatter.error(&format!("Failed to upload {}: {e}", args.source));
            ExitCode::from_error(&e)
        }
    }
}
