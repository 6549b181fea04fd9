//! Error types for fr-core
//!
//! One taxonomy shared by every backend. The retry engine and the public
//! degrade-to-boolean contract both key off these variants.

use thiserror::Error;

/// Result type alias for fr-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for file-reference operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file error (missing credentials, bad block)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed path or path segment
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// No credential block configured for a host
    #[error("No host configured: {0}")]
    HostNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Authentication failure
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Remote side definitively reported the entry absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network error (retryable)
    #[error("Network error: {0}")]
    Network(String),

    /// Transfer attempted against a directory
    #[error("Is a directory: {0}")]
    IsDirectory(String),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Whether this error never benefits from a retry.
    ///
    /// Backends build their classifiers on top of this: configuration and
    /// path errors must surface to the caller unchanged, and a definite
    /// "not found" must not burn retry budget.
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Error::Config(_)
                | Error::InvalidPath(_)
                | Error::HostNotFound(_)
                | Error::NotFound(_)
                | Error::IsDirectory(_)
                | Error::TomlParse(_)
                | Error::TomlSerialize(_)
        )
    }

    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidPath(_) => 2,                        // UsageError
            Error::Config(_) => 2,                             // UsageError
            Error::TomlParse(_) | Error::TomlSerialize(_) => 2, // UsageError
            Error::Network(_) => 3,                            // NetworkError
            Error::Auth(_) => 4,                               // AuthError
            Error::NotFound(_) | Error::HostNotFound(_) => 5,  // NotFound
            Error::IsDirectory(_) => 6,                        // Misuse
            _ => 1,                                            // GeneralError
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(Error::InvalidPath("test".into()).exit_code(), 2);
        assert_eq!(Error::Config("test".into()).exit_code(), 2);
        assert_eq!(Error::Network("test".into()).exit_code(), 3);
        assert_eq!(Error::Auth("test".into()).exit_code(), 4);
        assert_eq!(Error::NotFound("test".into()).exit_code(), 5);
        assert_eq!(Error::HostNotFound("test".into()).exit_code(), 5);
        assert_eq!(Error::IsDirectory("test".into()).exit_code(), 6);
        assert_eq!(Error::General("test".into()).exit_code(), 1);
    }

    #[test]
    fn test_terminal_classification() {
        assert!(Error::InvalidPath("x".into()).is_terminal());
        assert!(Error::NotFound("x".into()).is_terminal());
        assert!(Error::IsDirectory("x".into()).is_terminal());
        assert!(!Error::Network("reset".into()).is_terminal());
        assert!(!Error::Auth("denied".into()).is_terminal());
    }

    #[test]
    fn test_error_display() {
        let err = Error::HostNotFound("build.example.com".into());
        assert_eq!(err.to_string(), "No host configured: build.example.com");

        let err = Error::InvalidPath("a/b".into());
        assert_eq!(err.to_string(), "Invalid path: a/b");
    }
}
