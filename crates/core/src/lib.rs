//! fr-core: backend-agnostic file references
//!
//! This crate provides the core of the fileref library:
//! - Path model and segment sanitation
//! - The `FileRef` trait every remote backend implements
//! - The local-disk collaborator used on the local side of transfers
//! - Configuration and per-host credential resolution
//! - The fixed-delay retry engine shared by the backends
//!
//! It is independent of any backend SDK; the object-storage and
//! remote-shell implementations live in their own crates.

pub mod config;
pub mod credentials;
pub mod error;
pub mod fileref;
pub mod local;
pub mod path;
pub mod retry;

pub use config::{Config, ConfigManager, HostBlock, StorageBlock, DEFAULT_SSH_PORT};
pub use credentials::{resolve_credentials, AuthMethod, Credentials};
pub use error::{Error, Result};
pub use fileref::{walk_files, FileRef};
pub use local::{promote_staging, staging_target, LocalFileRef, TMP_SUFFIX};
pub use path::{RefPath, SEPARATOR};
pub use retry::{retry_fixed, RetryPolicy};
