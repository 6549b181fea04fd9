//! Local-disk collaborator
//!
//! The narrow contract the remote backends consume on the local side of a
//! transfer: existence and kind checks, parent/mkdirs, sibling derivation,
//! atomic rename, and access to the native path for the transfer calls
//! themselves. Not a third implementation of the full reference trait.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Suffix appended to a safe-download staging file.
pub const TMP_SUFFIX: &str = ".tmp";

/// An immutable reference to a local filesystem location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileRef {
    path: PathBuf,
}

impl LocalFileRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The underlying native path, for transfer calls.
    pub fn native(&self) -> &Path {
        &self.path
    }

    /// Final path component, empty at a filesystem root.
    pub fn name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
    }

    /// Containing directory. A bare relative name belongs to `.`; a
    /// filesystem root is its own parent.
    pub fn parent(&self) -> Self {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => Self::new(parent),
            Some(_) => Self::new("."),
            None => self.clone(),
        }
    }

    /// A reference alongside this one, with the name rewritten.
    pub fn sibling(&self, transform: impl FnOnce(&str) -> String) -> Self {
        Self::new(self.path.with_file_name(transform(self.name())))
    }

    pub async fn exists(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }

    pub async fn is_directory(&self) -> bool {
        tokio::fs::metadata(&self.path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    /// Size in bytes of the referenced file.
    pub async fn size(&self) -> Result<u64> {
        Ok(tokio::fs::metadata(&self.path).await?.len())
    }

    /// Create this directory and every missing ancestor. Idempotent:
    /// returns `Ok(true)` whether the directory existed or was created.
    pub async fn mkdirs(&self) -> Result<bool> {
        tokio::fs::create_dir_all(&self.path).await?;
        Ok(true)
    }

    /// Atomically rename onto `target`, replacing it if present.
    pub async fn rename(&self, target: &LocalFileRef) -> Result<()> {
        tokio::fs::rename(&self.path, &target.path).await?;
        Ok(())
    }

    /// Remove the file or (empty) directory. Returns whether something
    /// existed and was removed; a no-op returns `Ok(false)`.
    pub async fn delete(&self) -> Result<bool> {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) if meta.is_dir() => {
                tokio::fs::remove_dir(&self.path).await?;
                Ok(true)
            }
            Ok(_) => {
                tokio::fs::remove_file(&self.path).await?;
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Guard a transfer source or destination against directory misuse.
    pub async fn ensure_not_directory(&self) -> Result<()> {
        if self.is_directory().await {
            return Err(Error::IsDirectory(self.path.display().to_string()));
        }
        Ok(())
    }
}

impl std::fmt::Display for LocalFileRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "file://{}", self.path.display())
    }
}

/// Where a download writes: the target itself, or a `.tmp` sibling when
/// the safe protocol is requested.
///
/// Staging-file creation performs no locking; two concurrent safe
/// downloads of the same target race on the staging name.
pub fn staging_target(target: &LocalFileRef, safe: bool) -> LocalFileRef {
    if safe {
        target.sibling(|name| format!("{name}{TMP_SUFFIX}"))
    } else {
        target.clone()
    }
}

/// Complete a safe download.
///
/// The staging file's existence is the success signal: if present it is
/// atomically renamed onto the target; if absent the destination is left
/// exactly as it was. When `transferred` is false a leftover staging
/// artifact is discarded.
pub async fn promote_staging(
    staging: &LocalFileRef,
    target: &LocalFileRef,
    transferred: bool,
) -> Result<bool> {
    if !transferred {
        let _ = staging.delete().await;
        return Ok(false);
    }

    if staging.exists().await {
        staging.rename(target).await?;
        Ok(true)
    } else {
        Ok(false)
    }
}
