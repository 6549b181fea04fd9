//! fr-ssh: remote-shell backend for fileref
//!
//! Implements the `FileRef` trait over SSH with the SFTP subsystem. It is
//! the only crate that directly depends on the SSH transport. Unlike the
//! object-storage backend's cached client, every logical operation here
//! opens a fresh authenticated session, performs one primitive, and tears
//! the session down; nothing is pooled or shared.

pub mod fileref;
pub mod session;

pub use fileref::SshFileRef;
pub use session::{is_transient_connect, SshSession};
