//! URI routing across backends
//!
//! Commands accept one URI argument and dispatch to whichever backend its
//! scheme names. Both arms present the shared `FileRef` capability set,
//! so every command body stays backend-agnostic.

use futures::StreamExt;

use fr_core::{Config, Error, FileRef, LocalFileRef, Result};
use fr_s3::S3FileRef;
use fr_ssh::SshFileRef;

/// A file reference in whichever backend a URI names.
#[derive(Debug, Clone)]
pub enum RemoteRef {
    S3(S3FileRef),
    Ssh(SshFileRef),
}

impl RemoteRef {
    /// Route `s3://…` and `sftp://…` URIs to their backend.
    pub fn parse(uri: &str, config: &Config) -> Result<Self> {
        if uri.starts_with("s3://") {
            Ok(Self::S3(S3FileRef::from_uri(uri, config)?))
        } else if uri.starts_with("sftp://") {
            Ok(Self::Ssh(SshFileRef::from_uri(uri, config)?))
        } else {
            Err(Error::InvalidPath(format!(
                "expected an s3:// or sftp:// URI, got '{uri}'"
            )))
        }
    }

    pub fn uri(&self) -> String {
        match self {
            Self::S3(r) => r.uri(),
            Self::Ssh(r) => r.uri(),
        }
    }

    pub fn name(&self) -> String {
        match self {
            Self::S3(r) => r.name().to_string(),
            Self::Ssh(r) => r.name().to_string(),
        }
    }

    pub async fn exists(&self) -> Result<bool> {
        match self {
            Self::S3(r) => r.exists().await,
            Self::Ssh(r) => r.exists().await,
        }
    }

    pub async fn is_directory(&self) -> Result<bool> {
        match self {
            Self::S3(r) => r.is_directory().await,
            Self::Ssh(r) => r.is_directory().await,
        }
    }

    /// Immediate children as display URIs.
    pub async fn list_uris(&self) -> Result<Vec<String>> {
        match self {
            Self::S3(r) => Ok(r.list().await?.iter().map(FileRef::uri).collect()),
            Self::Ssh(r) => Ok(r.list().await?.iter().map(FileRef::uri).collect()),
        }
    }

    /// Depth-first file matches as display URIs.
    pub async fn find_file_uris(&self, prefix: &str) -> Vec<String> {
        match self {
            Self::S3(r) => r.find_files(prefix).map(|e| e.uri()).collect().await,
            Self::Ssh(r) => r.find_files(prefix).map(|e| e.uri()).collect().await,
        }
    }

    pub async fn delete(&self) -> Result<bool> {
        match self {
            Self::S3(r) => r.delete().await,
            Self::Ssh(r) => r.delete().await,
        }
    }

    pub async fn mkdirs(&self) -> Result<bool> {
        match self {
            Self::S3(r) => r.mkdirs().await,
            Self::Ssh(r) => r.mkdirs().await,
        }
    }

    pub async fn download(&self, target: &LocalFileRef, safe: bool) -> Result<bool> {
        match self {
            Self::S3(r) => r.download(target, safe).await,
            Self::Ssh(r) => r.download(target, safe).await,
        }
    }

    pub async fn upload(&self, source: &LocalFileRef) -> Result<bool> {
        match self {
            Self::S3(r) => r.upload(source).await,
            Self::Ssh(r) => r.upload(source).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fr_core::{HostBlock, StorageBlock};

    fn config() -> Config {
        let mut config = Config::default();
        config.hosts.insert(
            "build.example.com".into(),
            HostBlock {
                username: "deploy".into(),
                port: 22,
                keypair_file: None,
                password: Some("hunter2".into()),
            },
        );
        config.storage = Some(StorageBlock {
            endpoint: "http://localhost:9000".into(),
            access_key: "ak".into(),
            secret_key: "sk".into(),
            region: "us-east-1".into(),
            bucket: "artifacts".into(),
        });
        config
    }

    #[test]
    fn test_parse_s3() {
        let remote = RemoteRef::parse("s3://artifacts/logs/run.csv", &config()).unwrap();
        assert!(matches!(remote, RemoteRef::S3(_)));
        assert_eq!(remote.uri(), "s3://artifacts/logs/run.csv");
        assert_eq!(remote.name(), "run.csv");
    }

    #[test]
    fn test_parse_sftp() {
        let remote = RemoteRef::parse("sftp://build.example.com/data/x.txt", &config()).unwrap();
        assert!(matches!(remote, RemoteRef::Ssh(_)));
        assert_eq!(remote.uri(), "sftp://deploy@build.example.com/data/x.txt");
    }

    #[test]
    fn test_parse_unknown_scheme() {
        assert!(matches!(
            RemoteRef::parse("ftp://host/x", &config()),
            Err(Error::InvalidPath(_))
        ));
    }
}
