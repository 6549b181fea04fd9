//! Credential resolution
//!
//! Maps a URI-like path string against the configured per-host credential
//! blocks into concrete connection parameters. The backend supplies the
//! pattern that extracts its identifier (the hostname) from the string, so
//! descriptors can be built from a bare URI plus one shared configuration
//! object.

use std::path::PathBuf;

use regex::Regex;

use crate::config::Config;
use crate::error::{Error, Result};

/// How a session authenticates against a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMethod {
    /// Private key file on local disk
    KeyFile(PathBuf),
    /// Plain password
    Password(String),
}

/// Resolved connection parameters for one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub host: String,
    pub user: String,
    pub port: u16,
    pub auth: AuthMethod,
}

impl Credentials {
    /// Build credentials from explicit values, bypassing configuration.
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        port: u16,
        auth: AuthMethod,
    ) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            port,
            auth,
        }
    }
}

/// Resolve a URI-like path against the configuration tree.
///
/// `pattern` is backend-supplied and must capture the host identifier in
/// its first group. Fails with an invalid-argument error when the pattern
/// does not match, when no credential block exists for the host, or when
/// the block carries neither a key file nor a password. When a block
/// carries both, the key file wins.
pub fn resolve_credentials(uri: &str, pattern: &Regex, config: &Config) -> Result<Credentials> {
    let host = pattern
        .captures(uri)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| Error::InvalidPath(format!("no host identifier in '{uri}'")))?;

    let block = config.host(&host)?;

    let auth = match (&block.keypair_file, &block.password) {
        (Some(key), _) => AuthMethod::KeyFile(key.clone()),
        (None, Some(password)) => AuthMethod::Password(password.clone()),
        (None, None) => {
            return Err(Error::Config(format!(
                "host '{host}' has neither keypair-file nor password"
            )));
        }
    };

    Ok(Credentials {
        host,
        user: block.username.clone(),
        port: block.port,
        auth,
    })
}
