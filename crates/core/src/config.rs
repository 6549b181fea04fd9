//! Configuration management
//!
//! Loads and saves the fref configuration file, stored in TOML format at
//! ~/.config/fref/config.toml. The file carries per-host credential blocks
//! for the remote-shell backend and one connection block for the
//! object-storage backend.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default SSH port when a host block does not specify one.
pub const DEFAULT_SSH_PORT: u16 = 22;

fn default_port() -> u16 {
    DEFAULT_SSH_PORT
}

fn default_region() -> String {
    "us-east-1".to_string()
}

/// Per-host credential block for the remote-shell backend.
///
/// Exactly one of `keypair-file` or `password` must be present; the
/// resolver rejects blocks carrying neither.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostBlock {
    /// Login user, required.
    pub username: String,

    /// SSH port, defaults to 22.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path to a private key file.
    #[serde(
        rename = "keypair-file",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub keypair_file: Option<PathBuf>,

    /// Plain password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Connection block for the object-storage backend.
///
/// Storage auth is an access-key pair, deliberately separate from the
/// host/user/port credential model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageBlock {
    /// S3-compatible endpoint URL
    pub endpoint: String,

    /// Access key ID
    #[serde(rename = "access-key")]
    pub access_key: String,

    /// Secret access key
    #[serde(rename = "secret-key")]
    pub secret_key: String,

    /// Region
    #[serde(default = "default_region")]
    pub region: String,

    /// Bucket every reference from this block is scoped to
    pub bucket: String,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Per-host credential blocks, keyed by hostname
    #[serde(default)]
    pub hosts: BTreeMap<String, HostBlock>,

    /// Object-storage connection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageBlock>,
}

impl Config {
    /// Look up the credential block for a host.
    pub fn host(&self, hostname: &str) -> Result<&HostBlock> {
        self.hosts
            .get(hostname)
            .ok_or_else(|| Error::HostNotFound(hostname.to_string()))
    }

    /// The object-storage block, or a configuration error if absent.
    pub fn storage(&self) -> Result<&StorageBlock> {
        self.storage
            .as_ref()
            .ok_or_else(|| Error::Config("no [storage] block configured".into()))
    }
}

/// Configuration manager handles loading and saving config
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the default config path
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not determine config directory".into()))?;
        let config_path = config_dir.join("fref").join("config.toml");
        Ok(Self { config_path })
    }

    /// Create a ConfigManager with a custom path (useful for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk
    ///
    /// If the configuration file doesn't exist, returns a default
    /// (empty) configuration.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save configuration to disk
    ///
    /// Creates parent directories if they don't exist.
    /// Sets file permissions to 600 (owner read/write only).
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(config)?;
        std::fs::write(&self.config_path, content)?;

        // Set restrictive permissions on Unix systems
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.config_path, permissions)?;
        }

        Ok(())
    }
}
