//! Object-storage client
//!
//! Wraps aws-sdk-s3 with the key handling, pagination, and error
//! classification the file-reference layer builds on. The client is
//! created lazily on the first remote call and cached per bucket
//! instance; the bucket itself is provisioned if absent. Concurrent use
//! relies on the SDK client being internally thread-safe.

use std::path::Path;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::OnceCell;

use fr_core::{retry_fixed, Config, Error, Result, RetryPolicy, StorageBlock};

/// Transfer buffer size; one buffer is reused for a whole pull.
const TRANSFER_CHUNK: usize = 8 * 1024;

/// Fixed retry budget for storage calls.
const STORAGE_RETRY: RetryPolicy = RetryPolicy::new(3, Duration::from_secs(1));

/// Classifier for storage operations.
///
/// A definite "not found" and all validation errors are terminal; every
/// other service or client failure is worth the fixed retry budget.
pub fn is_transient_storage(error: &Error) -> bool {
    !error.is_terminal()
}

/// Strip the leading `./` some producers put on logical keys.
pub fn normalize_key(key: &str) -> &str {
    key.strip_prefix("./").unwrap_or(key)
}

/// A logical key split at the last `/` and the last `.`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyParts {
    /// Directory portion, without trailing separator; empty at top level.
    pub prefix: String,
    /// Base name without extension.
    pub base: String,
    /// Extension including the dot; empty when the name has none.
    pub extension: String,
}

impl KeyParts {
    pub fn split(key: &str) -> Self {
        let key = normalize_key(key);
        let (prefix, name) = match key.rfind('/') {
            Some(pos) => (&key[..pos], &key[pos + 1..]),
            None => ("", key),
        };
        let (base, extension) = match name.rfind('.') {
            Some(pos) => (&name[..pos], &name[pos..]),
            None => (name, ""),
        };
        Self {
            prefix: prefix.to_string(),
            base: base.to_string(),
            extension: extension.to_string(),
        }
    }

    /// Key of the sibling backup copy: `<prefix>/backup/<name><ext>`.
    pub fn backup_key(&self) -> String {
        if self.prefix.is_empty() {
            format!("backup/{}{}", self.base, self.extension)
        } else {
            format!("{}/backup/{}{}", self.prefix, self.base, self.extension)
        }
    }

    /// Bidirectional prefix match on base names: true when either base
    /// name is a prefix of the other.
    pub fn base_matches(&self, other: &KeyParts) -> bool {
        self.base.starts_with(&other.base) || other.base.starts_with(&self.base)
    }
}

/// Bucket-scoped object-storage client.
pub struct ObjectStorage {
    config: StorageBlock,
    client: OnceCell<aws_sdk_s3::Client>,
    retry: RetryPolicy,
}

impl ObjectStorage {
    /// Create a storage handle from an explicit connection block.
    ///
    /// No remote call happens here; the SDK client is built on first use.
    pub fn new(config: StorageBlock) -> Self {
        Self {
            config,
            client: OnceCell::new(),
            retry: STORAGE_RETRY,
        }
    }

    /// Create a storage handle from the shared configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.storage()?.clone()))
    }

    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }

    /// The cached SDK client, built (and the bucket created if absent)
    /// on the first call.
    async fn client(&self) -> Result<&aws_sdk_s3::Client> {
        self.client
            .get_or_try_init(|| async {
                let credentials = aws_credential_types::Credentials::new(
                    self.config.access_key.clone(),
                    self.config.secret_key.clone(),
                    None, // session token
                    None, // expiry
                    "fref-static-credentials",
                );

                let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                    .credentials_provider(credentials)
                    .region(aws_config::Region::new(self.config.region.clone()))
                    .endpoint_url(&self.config.endpoint)
                    .load()
                    .await;

                // Path-style addressing for S3-compatible endpoints.
                let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
                    .force_path_style(true)
                    .build();

                let client = aws_sdk_s3::Client::from_conf(s3_config);

                match client.head_bucket().bucket(&self.config.bucket).send().await {
                    Ok(_) => {}
                    Err(e) if is_not_found_text(&e.to_string()) => {
                        client
                            .create_bucket()
                            .bucket(&self.config.bucket)
                            .send()
                            .await
                            .map_err(|e| Error::Network(e.to_string()))?;
                        tracing::debug!(bucket = %self.config.bucket, "Created missing bucket");
                    }
                    Err(e) => return Err(Error::Network(e.to_string())),
                }

                Ok(client)
            })
            .await
    }

    /// Whether an object exists at `key`. Degrades to `Ok(false)` after
    /// the retry budget; a definite "not found" costs no retries.
    pub async fn head(&self, key: &str) -> Result<bool> {
        let key = normalize_key(key);
        let outcome = retry_fixed(&self.retry, || self.head_raw(key), is_transient_storage).await;
        degrade(outcome, false, "head", key)
    }

    async fn head_raw(&self, key: &str) -> Result<bool> {
        let client = self.client().await?;
        client
            .head_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_err(e, key))?;
        Ok(true)
    }

    /// Whether any key exists under `prefix`.
    pub async fn has_children(&self, prefix: &str) -> Result<bool> {
        let prefix = normalize_key(prefix);
        let outcome = retry_fixed(
            &self.retry,
            || self.has_children_raw(prefix),
            is_transient_storage,
        )
        .await;
        degrade(outcome, false, "has_children", prefix)
    }

    async fn has_children_raw(&self, prefix: &str) -> Result<bool> {
        let client = self.client().await?;
        let response = client
            .list_objects_v2()
            .bucket(&self.config.bucket)
            .prefix(prefix)
            .max_keys(1)
            .send()
            .await
            .map_err(|e| map_sdk_err(e, prefix))?;
        Ok(response.key_count().unwrap_or(0) > 0)
    }

    /// Immediate children under `prefix` as `(name, is_directory)`
    /// pairs, via a delimiter listing. Degrades to empty.
    pub async fn list_dir(&self, prefix: &str) -> Result<Vec<(String, bool)>> {
        let prefix = normalize_key(prefix).to_string();
        let outcome = retry_fixed(
            &self.retry,
            || self.list_dir_raw(&prefix),
            is_transient_storage,
        )
        .await;
        degrade(outcome, Vec::new(), "list_dir", &prefix)
    }

    async fn list_dir_raw(&self, prefix: &str) -> Result<Vec<(String, bool)>> {
        let client = self.client().await?;
        let mut entries = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut request = client
                .list_objects_v2()
                .bucket(&self.config.bucket)
                .prefix(prefix)
                .delimiter("/");
            if let Some(token) = &continuation {
                request = request.continuation_token(token);
            }

            let response = request.send().await.map_err(|e| map_sdk_err(e, prefix))?;

            for common in response.common_prefixes() {
                if let Some(p) = common.prefix() {
                    let name = p
                        .strip_prefix(prefix)
                        .unwrap_or(p)
                        .trim_end_matches('/');
                    if !name.is_empty() {
                        entries.push((name.to_string(), true));
                    }
                }
            }

            for object in response.contents() {
                let Some(key) = object.key() else { continue };
                if key.ends_with('/') {
                    continue; // directory marker
                }
                let name = key.strip_prefix(prefix).unwrap_or(key);
                if !name.is_empty() {
                    entries.push((name.to_string(), false));
                }
            }

            if response.is_truncated().unwrap_or(false) {
                continuation = response.next_continuation_token().map(String::from);
            } else {
                break;
            }
        }

        Ok(entries)
    }

    /// All non-marker keys in the query's directory whose base name and
    /// the query's base name are prefixes of each other, in either
    /// direction. Paginates the full listing; degrades to empty.
    pub async fn find_matching(&self, key: &str) -> Result<Vec<String>> {
        let key = normalize_key(key).to_string();
        let query = KeyParts::split(&key);
        let list_prefix = if query.prefix.is_empty() {
            String::new()
        } else {
            format!("{}/", query.prefix)
        };

        let outcome = retry_fixed(
            &self.retry,
            || self.find_matching_raw(&list_prefix, &query),
            is_transient_storage,
        )
        .await;
        degrade(outcome, Vec::new(), "find_matching", &key)
    }

    async fn find_matching_raw(&self, list_prefix: &str, query: &KeyParts) -> Result<Vec<String>> {
        let client = self.client().await?;
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut request = client
                .list_objects_v2()
                .bucket(&self.config.bucket)
                .prefix(list_prefix);
            if let Some(token) = &continuation {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| map_sdk_err(e, list_prefix))?;

            for object in response.contents() {
                let Some(key) = object.key() else { continue };
                if key.ends_with('/') {
                    continue;
                }
                if KeyParts::split(key).base_matches(query) {
                    keys.push(key.to_string());
                }
            }

            if response.is_truncated().unwrap_or(false) {
                continuation = response.next_continuation_token().map(String::from);
            } else {
                break;
            }
        }

        Ok(keys)
    }

    /// Stream a local file up to `key`. Degrades to `Ok(false)`.
    pub async fn push(&self, key: &str, source: &Path) -> Result<bool> {
        let key = normalize_key(key);
        let outcome = retry_fixed(
            &self.retry,
            || self.push_raw(key, source),
            is_transient_storage,
        )
        .await;
        degrade(outcome, false, "push", key)
    }

    async fn push_raw(&self, key: &str, source: &Path) -> Result<bool> {
        let client = self.client().await?;
        let body = aws_sdk_s3::primitives::ByteStream::from_path(source)
            .await
            .map_err(|e| Error::Io(std::io::Error::other(e)))?;
        let content_type = mime_guess::from_path(source)
            .first()
            .map(|m| m.essence_str().to_string());

        let mut request = client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .body(body);
        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        request.send().await.map_err(|e| map_sdk_err(e, key))?;
        Ok(true)
    }

    /// Stream `key` down into `target`, in fixed-size chunks through one
    /// reused buffer. Both streams close on every exit path (drop on
    /// failure, explicit flush on success). Degrades to `Ok(false)`.
    pub async fn pull(&self, key: &str, target: &Path) -> Result<bool> {
        let key = normalize_key(key);
        let outcome = retry_fixed(
            &self.retry,
            || self.pull_raw(key, target),
            is_transient_storage,
        )
        .await;
        degrade(outcome, false, "pull", key)
    }

    async fn pull_raw(&self, key: &str, target: &Path) -> Result<bool> {
        let client = self.client().await?;
        let response = client
            .get_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_err(e, key))?;

        let mut body = response.body.into_async_read();
        let mut file = tokio::fs::File::create(target).await?;
        let mut buf = [0u8; TRANSFER_CHUNK];

        loop {
            let n = body
                .read(&mut buf)
                .await
                .map_err(|e| Error::Network(e.to_string()))?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n]).await?;
        }

        file.flush().await?;
        Ok(true)
    }

    /// Server-side copy of `key` to `<prefix>/backup/<name><ext>` in the
    /// same bucket. The source is left untouched. Degrades to `Ok(false)`.
    pub async fn backup(&self, key: &str) -> Result<bool> {
        let key = normalize_key(key);
        let backup_key = KeyParts::split(key).backup_key();

        let outcome = retry_fixed(
            &self.retry,
            || self.backup_raw(key, &backup_key),
            is_transient_storage,
        )
        .await;
        degrade(outcome, false, "backup", key)
    }

    async fn backup_raw(&self, key: &str, backup_key: &str) -> Result<bool> {
        let client = self.client().await?;
        client
            .copy_object()
            .copy_source(format!("{}/{}", self.config.bucket, key))
            .bucket(&self.config.bucket)
            .key(backup_key)
            .send()
            .await
            .map_err(|e| map_sdk_err(e, key))?;
        Ok(true)
    }

    /// Apply a canned access-control policy to `key`. Degrades to
    /// `Ok(false)`.
    pub async fn set_acl(&self, key: &str, acl: &str) -> Result<bool> {
        let key = normalize_key(key);
        let outcome = retry_fixed(
            &self.retry,
            || self.set_acl_raw(key, acl),
            is_transient_storage,
        )
        .await;
        degrade(outcome, false, "set_acl", key)
    }

    async fn set_acl_raw(&self, key: &str, acl: &str) -> Result<bool> {
        let client = self.client().await?;
        client
            .put_object_acl()
            .bucket(&self.config.bucket)
            .key(key)
            .acl(aws_sdk_s3::types::ObjectCannedAcl::from(acl))
            .send()
            .await
            .map_err(|e| map_sdk_err(e, key))?;
        Ok(true)
    }

    /// Delete one object. Returns whether it existed. Degrades to
    /// `Ok(false)`.
    pub async fn delete_key(&self, key: &str) -> Result<bool> {
        let key = normalize_key(key);
        if !self.head(key).await? {
            return Ok(false);
        }

        let outcome = retry_fixed(
            &self.retry,
            || self.delete_key_raw(key),
            is_transient_storage,
        )
        .await;
        degrade(outcome, false, "delete_key", key)
    }

    async fn delete_key_raw(&self, key: &str) -> Result<bool> {
        let client = self.client().await?;
        client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_err(e, key))?;
        Ok(true)
    }

    /// Delete every key under `prefix`, non-empty trees included.
    /// Returns whether anything was removed. Degrades to `Ok(false)`.
    pub async fn delete_prefix(&self, prefix: &str) -> Result<bool> {
        let prefix = normalize_key(prefix).to_string();
        let outcome = retry_fixed(
            &self.retry,
            || self.delete_prefix_raw(&prefix),
            is_transient_storage,
        )
        .await;
        degrade(outcome, false, "delete_prefix", &prefix)
    }

    async fn delete_prefix_raw(&self, prefix: &str) -> Result<bool> {
        use aws_sdk_s3::types::{Delete, ObjectIdentifier};

        let client = self.client().await?;
        let mut removed_any = false;
        let mut continuation: Option<String> = None;

        loop {
            let mut request = client
                .list_objects_v2()
                .bucket(&self.config.bucket)
                .prefix(prefix);
            if let Some(token) = &continuation {
                request = request.continuation_token(token);
            }

            let response = request.send().await.map_err(|e| map_sdk_err(e, prefix))?;

            let objects: Vec<ObjectIdentifier> = response
                .contents()
                .iter()
                .filter_map(|o| o.key())
                .filter_map(|k| ObjectIdentifier::builder().key(k).build().ok())
                .collect();

            if !objects.is_empty() {
                let delete = Delete::builder()
                    .set_objects(Some(objects))
                    .build()
                    .map_err(|e| Error::General(e.to_string()))?;

                client
                    .delete_objects()
                    .bucket(&self.config.bucket)
                    .delete(delete)
                    .send()
                    .await
                    .map_err(|e| map_sdk_err(e, prefix))?;
                removed_any = true;
            }

            if response.is_truncated().unwrap_or(false) {
                continuation = response.next_continuation_token().map(String::from);
            } else {
                break;
            }
        }

        Ok(removed_any)
    }
}

impl std::fmt::Debug for ObjectStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStorage")
            .field("endpoint", &self.config.endpoint)
            .field("bucket", &self.config.bucket)
            .finish_non_exhaustive()
    }
}

fn is_not_found_text(text: &str) -> bool {
    text.contains("NotFound") || text.contains("NoSuchKey") || text.contains("NoSuchBucket")
}

fn map_sdk_err(err: impl std::fmt::Display, context: &str) -> Error {
    let text = err.to_string();
    if is_not_found_text(&text) {
        Error::NotFound(context.to_string())
    } else {
        Error::Network(text)
    }
}

/// Collapse a post-retry outcome into the degrade-to-boolean contract:
/// a definite "not found" and an exhausted budget both become the empty
/// value; validation errors keep propagating.
fn degrade<T>(outcome: Result<T>, empty: T, op: &str, key: &str) -> Result<T> {
    match outcome {
        Ok(value) => Ok(value),
        Err(Error::NotFound(_)) => Ok(empty),
        Err(e) if e.is_terminal() => Err(e),
        Err(e) => {
            tracing::warn!(op, key, error = %e, "Storage operation degraded after retries");
            Ok(empty)
        }
    }
}
