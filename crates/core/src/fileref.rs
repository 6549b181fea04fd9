//! File-reference trait
//!
//! The common capability set every remote backend implements. Navigation
//! (`child`, `parent`) is provided on top of the shared path model so the
//! sanitation rules cannot drift between backends; state-querying and
//! transfer operations always round-trip to the backend, with no caching.
//!
//! Error contract: navigation and misuse errors propagate as `Err`;
//! remote failures that survive the retry budget degrade to
//! `Ok(false)`/empty results inside the backend implementations and never
//! escape as errors.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};

use crate::error::Result;
use crate::local::LocalFileRef;
use crate::path::RefPath;

/// An immutable reference to a location inside a storage backend.
#[async_trait]
pub trait FileRef: Clone + Send + Sync {
    /// Canonical path of this reference.
    fn path(&self) -> &RefPath;

    /// A new reference to `path` sharing this reference's backend handle.
    ///
    /// The provided navigation methods are built on this; implementations
    /// must not carry over any per-path state.
    fn with_path(&self, path: RefPath) -> Self;

    /// Diagnostic form: `<scheme>://<user>@<host><absolute-path>`.
    fn uri(&self) -> String;

    /// Last path element, empty at the root.
    fn name(&self) -> &str {
        self.path().name()
    }

    /// A reference to the named entry below this one.
    ///
    /// Empty or whitespace-only names are a no-op; a single trailing
    /// separator is stripped; any other embedded separator fails.
    fn child(&self, name: &str) -> Result<Self> {
        Ok(self.with_path(self.path().child(name)?))
    }

    /// A reference `levels` elements up, clamping at the root.
    fn parent(&self, levels: usize) -> Self {
        self.with_path(self.path().parent(levels))
    }

    /// Whether the referenced entry exists. Always round-trips.
    async fn exists(&self) -> Result<bool>;

    /// Whether the referenced entry is a directory. Always round-trips.
    async fn is_directory(&self) -> Result<bool>;

    /// Immediate children; empty when this is not a directory.
    async fn list(&self) -> Result<Vec<Self>>;

    /// Remove the referenced file or directory (empty/non-empty is
    /// backend-dependent). Returns whether something existed and was
    /// removed; a no-op returns `Ok(false)`.
    async fn delete(&self) -> Result<bool>;

    /// Create this directory and missing ancestors. Idempotent:
    /// `Ok(true)` whether it already existed or was just created.
    async fn mkdirs(&self) -> Result<bool>;

    /// Whole-file download to `target`.
    ///
    /// With `safe` the content goes to a `.tmp` sibling first and is
    /// atomically renamed onto `target` only once the staging file is
    /// present after the transfer; the destination is never left
    /// partially written. Without `safe` the destination is written
    /// directly and a failed transfer may leave a partial file.
    /// Fails with [`crate::Error::IsDirectory`] when either side is a
    /// directory.
    async fn download(&self, target: &LocalFileRef, safe: bool) -> Result<bool>;

    /// Whole-file upload from `source`. Fails with
    /// [`crate::Error::IsDirectory`] when either side is a directory.
    async fn upload(&self, source: &LocalFileRef) -> Result<bool>;

    /// Lazy depth-first traversal yielding only file entries whose name
    /// starts with `prefix`. Restartable: each call walks afresh. Finite
    /// iff the backend tree is finite.
    fn find_files<'a>(&'a self, prefix: &'a str) -> BoxStream<'a, Self> {
        walk_files(self.clone(), prefix)
    }
}

/// Depth-first expansion behind [`FileRef::find_files`].
///
/// Directories are expanded lazily as the stream is polled; listing or
/// probe failures on a subtree are logged and skip that subtree rather
/// than ending the walk.
pub fn walk_files<'a, R>(root: R, prefix: &'a str) -> BoxStream<'a, R>
where
    R: FileRef + 'a,
{
    stream::unfold(vec![root], move |mut stack| async move {
        while let Some(entry) = stack.pop() {
            match entry.is_directory().await {
                Ok(true) => match entry.list().await {
                    Ok(mut children) => {
                        // Reversed so the first child is expanded first.
                        children.reverse();
                        stack.extend(children);
                    }
                    Err(e) => {
                        tracing::warn!(uri = %entry.uri(), error = %e, "Skipping unlistable directory");
                    }
                },
                Ok(false) => {
                    if entry.name().starts_with(prefix) && entry.exists().await.unwrap_or(false) {
                        return Some((entry, stack));
                    }
                }
                Err(e) => {
                    tracing::warn!(uri = %entry.uri(), error = %e, "Skipping unreadable entry");
                }
            }
        }
        None
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    /// In-memory backend: a flat set of absolute file paths, directories
    /// implied by structure.
    #[derive(Debug, Clone)]
    struct MemRef {
        files: Arc<BTreeSet<String>>,
        path: RefPath,
    }

    impl MemRef {
        fn tree(files: &[&str]) -> Self {
            Self {
                files: Arc::new(files.iter().map(|s| s.to_string()).collect()),
                path: RefPath::root(),
            }
        }

        fn dir_prefix(&self) -> String {
            if self.path.is_root() {
                "/".to_string()
            } else {
                format!("{}/", self.path.absolute())
            }
        }
    }

    #[async_trait]
    impl FileRef for MemRef {
        fn path(&self) -> &RefPath {
            &self.path
        }

        fn with_path(&self, path: RefPath) -> Self {
            Self {
                files: self.files.clone(),
                path,
            }
        }

        fn uri(&self) -> String {
            format!("mem://{}", self.path.absolute())
        }

        async fn exists(&self) -> Result<bool> {
            Ok(self.files.contains(&self.path.absolute()) || self.is_directory().await?)
        }

        async fn is_directory(&self) -> Result<bool> {
            let prefix = self.dir_prefix();
            Ok(self.path.is_root() || self.files.iter().any(|f| f.starts_with(&prefix)))
        }

        async fn list(&self) -> Result<Vec<Self>> {
            let prefix = self.dir_prefix();
            let names: BTreeSet<&str> = self
                .files
                .iter()
                .filter_map(|f| f.strip_prefix(&prefix))
                .map(|rest| rest.split('/').next().unwrap_or(rest))
                .collect();
            names.into_iter().map(|n| self.child(n)).collect()
        }

        async fn delete(&self) -> Result<bool> {
            Ok(false)
        }

        async fn mkdirs(&self) -> Result<bool> {
            Ok(true)
        }

        async fn download(&self, _target: &LocalFileRef, _safe: bool) -> Result<bool> {
            Ok(false)
        }

        async fn upload(&self, _source: &LocalFileRef) -> Result<bool> {
            Ok(false)
        }
    }

    #[test]
    fn test_child_name_round_trip() {
        let root = MemRef::tree(&[]);
        let child = root.child("run.csv").unwrap();
        assert_eq!(child.name(), "run.csv");
        assert_eq!(child.parent(1).path(), root.path());
    }

    #[test]
    fn test_child_validation_via_trait() {
        let root = MemRef::tree(&[]);
        assert_eq!(root.child("a/").unwrap().path(), root.child("a").unwrap().path());
        assert_eq!(root.child("  ").unwrap().path(), root.path());
        assert!(matches!(root.child("a/b"), Err(Error::InvalidPath(_))));
    }

    #[test]
    fn test_uri_of_nested_child() {
        let root = MemRef::tree(&[]);
        let nested = root.child("data").unwrap().child("x.txt").unwrap();
        assert_eq!(nested.uri(), "mem:///data/x.txt");
    }

    #[tokio::test]
    async fn test_list_immediate_children() {
        let root = MemRef::tree(&["/a/one.txt", "/a/two.txt", "/b.txt"]);
        let names: Vec<String> = root
            .list()
            .await
            .unwrap()
            .iter()
            .map(|r| r.name().to_string())
            .collect();
        assert_eq!(names, vec!["a", "b.txt"]);
    }

    #[tokio::test]
    async fn test_walk_files_depth_first_leaves_only() {
        let root = MemRef::tree(&[
            "/logs/2020/run.csv",
            "/logs/2020/run.json",
            "/logs/readme.txt",
            "/top.csv",
        ]);

        let found: Vec<String> = root
            .find_files("")
            .map(|r| r.path().absolute())
            .collect()
            .await;

        // Depth-first: the logs subtree is fully expanded before top.csv.
        assert_eq!(
            found,
            vec![
                "/logs/2020/run.csv",
                "/logs/2020/run.json",
                "/logs/readme.txt",
                "/top.csv",
            ]
        );
    }

    #[tokio::test]
    async fn test_walk_files_filters_by_name_prefix() {
        let root = MemRef::tree(&[
            "/logs/2020/run.csv",
            "/logs/2020/summary.csv",
            "/run-notes.txt",
        ]);

        let found: Vec<String> = root
            .find_files("run")
            .map(|r| r.path().absolute())
            .collect()
            .await;

        assert_eq!(found, vec!["/logs/2020/run.csv", "/run-notes.txt"]);
    }

    #[tokio::test]
    async fn test_walk_files_is_restartable() {
        let root = MemRef::tree(&["/a.txt", "/b.txt"]);
        let first: Vec<_> = root.find_files("").collect().await;
        let second: Vec<_> = root.find_files("").collect().await;
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
    }
}
