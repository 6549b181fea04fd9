//! File references on SFTP-reachable hosts
//!
//! Every operation opens one session, performs its primitive, and closes
//! the session again. The transport gives no explicit transfer-outcome
//! signal, so download success is inferred solely from the destination
//! file's existence afterwards; a truncated transfer that still leaves a
//! file present is therefore misreported as success. Known weak point,
//! kept as-is.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use tokio::io::AsyncWriteExt;

use fr_core::{
    promote_staging, resolve_credentials, staging_target, Config, Credentials, Error, FileRef,
    LocalFileRef, RefPath, Result,
};

use crate::session::SshSession;

/// Host extraction pattern handed to the credentials resolver.
static HOST_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^sftp://(?:[^@/]+@)?([^:/]+)").expect("valid host pattern"));

/// An immutable reference to a path on one SFTP-reachable host.
#[derive(Debug, Clone)]
pub struct SshFileRef {
    creds: Arc<Credentials>,
    path: RefPath,
}

impl SshFileRef {
    /// Build from explicit connection parameters.
    pub fn new(creds: Credentials, path: RefPath) -> Self {
        Self {
            creds: Arc::new(creds),
            path,
        }
    }

    /// Build from `sftp://[user@]host[:port]/path` plus the shared
    /// configuration; credentials come from the host's config block.
    pub fn from_uri(uri: &str, config: &Config) -> Result<Self> {
        let creds = resolve_credentials(uri, &HOST_PATTERN, config)?;
        let parsed =
            url::Url::parse(uri).map_err(|e| Error::InvalidPath(format!("{uri}: {e}")))?;
        Ok(Self::new(creds, RefPath::parse(parsed.path())))
    }

    pub fn credentials(&self) -> &Credentials {
        &self.creds
    }

    fn remote_path(&self) -> String {
        self.path.absolute()
    }

    /// Session with the establishment failure contract applied: local
    /// (terminal) errors propagate, exhausted connection retries degrade
    /// to "no session" so the operation can report a boolean outcome.
    async fn open_session(&self) -> Result<Option<SshSession>> {
        match SshSession::open(&self.creds).await {
            Ok(session) => Ok(Some(session)),
            Err(e) if e.is_terminal() => Err(e),
            Err(e) => {
                tracing::warn!(host = %self.creds.host, error = %e, "Session establishment failed");
                Ok(None)
            }
        }
    }

    async fn metadata(&self) -> Result<Option<russh_sftp::protocol::FileAttributes>> {
        let Some(session) = self.open_session().await? else {
            return Ok(None);
        };
        let result = session.sftp().metadata(self.remote_path()).await;
        session.close().await;

        match result {
            Ok(attrs) => Ok(Some(attrs)),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => {
                tracing::warn!(uri = %self.uri(), error = %e, "Metadata probe failed");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl FileRef for SshFileRef {
    fn path(&self) -> &RefPath {
        &self.path
    }

    fn with_path(&self, path: RefPath) -> Self {
        Self {
            creds: self.creds.clone(),
            path,
        }
    }

    fn uri(&self) -> String {
        format!(
            "sftp://{}@{}{}",
            self.creds.user,
            self.creds.host,
            self.path.absolute()
        )
    }

    async fn exists(&self) -> Result<bool> {
        Ok(self.metadata().await?.is_some())
    }

    async fn is_directory(&self) -> Result<bool> {
        Ok(self
            .metadata()
            .await?
            .map(|attrs| attrs.is_dir())
            .unwrap_or(false))
    }

    async fn list(&self) -> Result<Vec<Self>> {
        let Some(session) = self.open_session().await? else {
            return Ok(Vec::new());
        };
        let result = session.sftp().read_dir(self.remote_path()).await;
        session.close().await;

        let entries = match result {
            Ok(entries) => entries,
            Err(e) => {
                if !is_not_found(&e) {
                    tracing::warn!(uri = %self.uri(), error = %e, "Listing failed");
                }
                return Ok(Vec::new());
            }
        };

        let mut children = Vec::new();
        for entry in entries {
            let name = entry.file_name();
            if name == "." || name == ".." {
                continue;
            }
            children.push(self.child(&name)?);
        }
        Ok(children)
    }

    async fn delete(&self) -> Result<bool> {
        let Some(attrs) = self.metadata().await? else {
            return Ok(false);
        };

        let Some(session) = self.open_session().await? else {
            return Ok(false);
        };
        let result = if attrs.is_dir() {
            // Only empty directories; SFTP has no recursive removal.
            session.sftp().remove_dir(self.remote_path()).await
        } else {
            session.sftp().remove_file(self.remote_path()).await
        };
        session.close().await;

        match result {
            Ok(()) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => {
                tracing::warn!(uri = %self.uri(), error = %e, "Removal failed");
                Ok(false)
            }
        }
    }

    async fn mkdirs(&self) -> Result<bool> {
        let Some(session) = self.open_session().await? else {
            return Ok(false);
        };

        let mut outcome = Ok(true);
        for depth in 1..=self.path.depth() {
            let partial = self.path.parent(self.path.depth() - depth).absolute();
            if session.sftp().metadata(&partial).await.is_ok() {
                continue;
            }
            if let Err(e) = session.sftp().create_dir(&partial).await {
                tracing::warn!(path = %partial, error = %e, "Directory creation failed");
                outcome = Ok(false);
                break;
            }
        }

        session.close().await;
        outcome
    }

    async fn download(&self, target: &LocalFileRef, safe: bool) -> Result<bool> {
        if self.is_directory().await? {
            return Err(Error::IsDirectory(self.uri()));
        }
        target.ensure_not_directory().await?;
        target.parent().mkdirs().await?;

        let staging = staging_target(target, safe);
        if let Some(session) = self.open_session().await? {
            match session.sftp().open(self.remote_path()).await {
                Ok(mut remote) => match tokio::fs::File::create(staging.native()).await {
                    Ok(mut local) => {
                        // Transfer errors are logged, not raised: the file
                        // left on disk afterwards is the only outcome
                        // signal this transport offers.
                        if let Err(e) = tokio::io::copy(&mut remote, &mut local).await {
                            tracing::warn!(uri = %self.uri(), error = %e, "Transfer interrupted");
                        }
                        let _ = local.flush().await;
                    }
                    Err(e) => {
                        tracing::warn!(target = %staging, error = %e, "Cannot open local file");
                    }
                },
                Err(e) => {
                    if !is_not_found(&e) {
                        tracing::warn!(uri = %self.uri(), error = %e, "Cannot open remote file");
                    }
                }
            }
            session.close().await;
        }

        let transferred = staging.exists().await;
        if safe {
            promote_staging(&staging, target, transferred).await
        } else {
            Ok(transferred)
        }
    }

    async fn upload(&self, source: &LocalFileRef) -> Result<bool> {
        source.ensure_not_directory().await?;
        if self.is_directory().await? {
            return Err(Error::IsDirectory(self.uri()));
        }
        if !source.exists().await {
            tracing::warn!(source = %source, "Upload source missing");
            return Ok(false);
        }

        let Some(session) = self.open_session().await? else {
            return Ok(false);
        };

        let sent = match session.sftp().create(self.remote_path()).await {
            Ok(mut remote) => match tokio::fs::File::open(source.native()).await {
                Ok(mut local) => {
                    let copied = tokio::io::copy(&mut local, &mut remote).await;
                    let closed = remote.shutdown().await;
                    match (copied, closed) {
                        (Ok(_), Ok(())) => true,
                        (copied, closed) => {
                            tracing::warn!(
                                uri = %self.uri(),
                                copy = ?copied.err(),
                                close = ?closed.err(),
                                "Send failed"
                            );
                            false
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(source = %source, error = %e, "Cannot open local file");
                    false
                }
            },
            Err(e) => {
                tracing::warn!(uri = %self.uri(), error = %e, "Cannot create remote file");
                false
            }
        };

        session.close().await;
        Ok(sent)
    }
}

fn is_not_found(error: &russh_sftp::client::error::Error) -> bool {
    matches!(
        error,
        russh_sftp::client::error::Error::Status(status)
            if status.status_code == russh_sftp::protocol::StatusCode::NoSuchFile
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use fr_core::{AuthMethod, HostBlock};
    use std::path::PathBuf;

    fn creds() -> Credentials {
        Credentials::new(
            "build.example.com",
            "deploy",
            2022,
            AuthMethod::Password("hunter2".into()),
        )
    }

    #[test]
    fn test_uri_diagnostic_form() {
        let fileref = SshFileRef::new(creds(), RefPath::parse("/data/x.txt"));
        assert_eq!(fileref.uri(), "sftp://deploy@build.example.com/data/x.txt");
    }

    #[test]
    fn test_navigation_shares_credentials() {
        let root = SshFileRef::new(creds(), RefPath::root());
        let child = root.child("data").unwrap();
        assert!(Arc::ptr_eq(&root.creds, &child.creds));
        assert_eq!(child.parent(1).path(), root.path());
        assert_eq!(child.parent(9).path(), root.path());
    }

    #[test]
    fn test_from_uri_resolves_host_block() {
        let mut config = Config::default();
        config.hosts.insert(
            "build.example.com".into(),
            HostBlock {
                username: "deploy".into(),
                port: 2022,
                keypair_file: Some(PathBuf::from("/keys/id_ed25519")),
                password: None,
            },
        );

        let fileref = SshFileRef::from_uri("sftp://build.example.com/data/x.txt", &config).unwrap();
        assert_eq!(fileref.credentials().host, "build.example.com");
        assert_eq!(fileref.credentials().port, 2022);
        assert_eq!(fileref.path().absolute(), "/data/x.txt");
    }

    #[test]
    fn test_from_uri_unknown_host() {
        let config = Config::default();
        assert!(matches!(
            SshFileRef::from_uri("sftp://ghost/data", &config),
            Err(Error::HostNotFound(_))
        ));
    }

    #[test]
    fn test_from_uri_wrong_scheme() {
        let config = Config::default();
        assert!(matches!(
            SshFileRef::from_uri("http://host/data", &config),
            Err(Error::InvalidPath(_))
        ));
    }

    #[test]
    fn test_host_pattern_ignores_user_and_port() {
        let captures = HOST_PATTERN
            .captures("sftp://ops@build.example.com:2022/data")
            .unwrap();
        assert_eq!(&captures[1], "build.example.com");
    }
}
