//! File references into object storage
//!
//! Keys are the separator-joined path elements; directories exist only as
//! shared key prefixes, so directory queries are listing probes and
//! `mkdirs` has nothing to create.

use std::sync::Arc;

use async_trait::async_trait;

use fr_core::{
    promote_staging, staging_target, Config, Error, FileRef, LocalFileRef, RefPath, Result,
};

use crate::client::ObjectStorage;

/// An immutable reference to one object (or key prefix) in a bucket.
#[derive(Debug, Clone)]
pub struct S3FileRef {
    storage: Arc<ObjectStorage>,
    path: RefPath,
}

impl S3FileRef {
    pub fn new(storage: Arc<ObjectStorage>, path: RefPath) -> Self {
        Self { storage, path }
    }

    /// Root reference from the shared configuration's `[storage]` block.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            Arc::new(ObjectStorage::from_config(config)?),
            RefPath::root(),
        ))
    }

    /// Build a reference from `s3://<bucket>/<key>` plus the shared
    /// configuration (which supplies endpoint and access keys).
    pub fn from_uri(uri: &str, config: &Config) -> Result<Self> {
        let parsed =
            url::Url::parse(uri).map_err(|e| Error::InvalidPath(format!("{uri}: {e}")))?;
        if parsed.scheme() != "s3" {
            return Err(Error::InvalidPath(format!(
                "expected s3:// scheme in '{uri}'"
            )));
        }
        let bucket = parsed
            .host_str()
            .ok_or_else(|| Error::InvalidPath(format!("missing bucket in '{uri}'")))?;

        let mut block = config.storage()?.clone();
        block.bucket = bucket.to_string();

        Ok(Self::new(
            Arc::new(ObjectStorage::new(block)),
            RefPath::parse(parsed.path()),
        ))
    }

    pub fn storage(&self) -> &ObjectStorage {
        &self.storage
    }

    /// Object key for this reference: the absolute path without its
    /// leading separator. Empty at the bucket root.
    pub fn key(&self) -> String {
        self.path.absolute()[1..].to_string()
    }

    /// Listing prefix for the directory this reference names.
    fn dir_prefix(&self) -> String {
        if self.path.is_root() {
            String::new()
        } else {
            format!("{}/", self.key())
        }
    }

    /// All keys in this reference's directory whose base name matches
    /// this reference's base name as a prefix in either direction.
    pub async fn find_matching(&self) -> Result<Vec<String>> {
        self.storage.find_matching(&self.key()).await
    }

    /// Server-side copy into the sibling `backup/` prefix.
    pub async fn backup(&self) -> Result<bool> {
        self.storage.backup(&self.key()).await
    }

    /// Apply a canned access-control policy to the referenced object.
    pub async fn set_acl(&self, acl: &str) -> Result<bool> {
        self.storage.set_acl(&self.key(), acl).await
    }
}

#[async_trait]
impl FileRef for S3FileRef {
    fn path(&self) -> &RefPath {
        &self.path
    }

    fn with_path(&self, path: RefPath) -> Self {
        Self {
            storage: self.storage.clone(),
            path,
        }
    }

    fn uri(&self) -> String {
        format!("s3://{}{}", self.storage.bucket(), self.path.absolute())
    }

    async fn exists(&self) -> Result<bool> {
        if self.path.is_root() {
            return Ok(true);
        }
        if self.storage.head(&self.key()).await? {
            return Ok(true);
        }
        self.storage.has_children(&self.dir_prefix()).await
    }

    async fn is_directory(&self) -> Result<bool> {
        if self.path.is_root() {
            return Ok(true);
        }
        self.storage.has_children(&self.dir_prefix()).await
    }

    async fn list(&self) -> Result<Vec<Self>> {
        if !self.is_directory().await? {
            return Ok(Vec::new());
        }
        let entries = self.storage.list_dir(&self.dir_prefix()).await?;
        let mut children = Vec::with_capacity(entries.len());
        for (name, _) in entries {
            children.push(self.child(&name)?);
        }
        Ok(children)
    }

    async fn delete(&self) -> Result<bool> {
        if self.storage.head(&self.key()).await? {
            return self.storage.delete_key(&self.key()).await;
        }
        if self.storage.has_children(&self.dir_prefix()).await? {
            return self.storage.delete_prefix(&self.dir_prefix()).await;
        }
        Ok(false)
    }

    async fn mkdirs(&self) -> Result<bool> {
        // Directories are implicit in the key space; nothing to create,
        // and repeat calls stay true.
        Ok(true)
    }

    async fn download(&self, target: &LocalFileRef, safe: bool) -> Result<bool> {
        if self.is_directory().await? {
            return Err(Error::IsDirectory(self.uri()));
        }
        target.ensure_not_directory().await?;
        target.parent().mkdirs().await?;

        let staging = staging_target(target, safe);
        let transferred = self.storage.pull(&self.key(), staging.native()).await?;

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
        self.storage.push(&self.key(), source.native()).await
    }
}
