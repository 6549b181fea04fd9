//! Integration tests for the fileref backends
//!
//! These tests require a running S3-compatible server.
//!
//! Run with:
//! ```bash
//! # Start a MinIO container
//! docker run -d --name minio -p 9000:9000 \
//!     -e MINIO_ROOT_USER=accesskey \
//!     -e MINIO_ROOT_PASSWORD=secretkey \
//!     minio/minio server /data
//!
//! # Run tests
//! FREF_TEST_ENDPOINT=http://localhost:9000 \
//! FREF_TEST_ACCESS_KEY=accesskey \
//! FREF_TEST_SECRET_KEY=secretkey \
//! cargo test -p fileref-cli --features integration
//! ```

#![cfg(feature = "integration")]

use std::sync::Arc;

use tempfile::TempDir;

use fr_core::{FileRef, LocalFileRef, RefPath, StorageBlock};
use fr_s3::{ObjectStorage, S3FileRef};

fn storage(bucket: &str) -> Arc<ObjectStorage> {
    let endpoint =
        std::env::var("FREF_TEST_ENDPOINT").unwrap_or_else(|_| "http://localhost:9000".into());
    let access_key = std::env::var("FREF_TEST_ACCESS_KEY").unwrap_or_else(|_| "accesskey".into());
    let secret_key = std::env::var("FREF_TEST_SECRET_KEY").unwrap_or_else(|_| "secretkey".into());

    Arc::new(ObjectStorage::new(StorageBlock {
        endpoint,
        access_key,
        secret_key,
        region: "us-east-1".into(),
        bucket: bucket.into(),
    }))
}

fn root(bucket: &str) -> S3FileRef {
    S3FileRef::new(storage(bucket), RefPath::root())
}

#[tokio::test]
async fn test_upload_then_safe_download_round_trip() {
    let dir = TempDir::new().unwrap();
    let source = LocalFileRef::new(dir.path().join("x.txt"));
    tokio::fs::write(source.native(), b"hi").await.unwrap();

    let remote = root("fref-it-roundtrip")
        .child("data")
        .unwrap()
        .child("x.txt")
        .unwrap();

    assert!(remote.upload(&source).await.unwrap());
    assert!(remote.exists().await.unwrap());

    let target = LocalFileRef::new(dir.path().join("y.txt"));
    assert!(remote.download(&target, true).await.unwrap());

    assert_eq!(tokio::fs::read(target.native()).await.unwrap(), b"hi");
    let leftover = LocalFileRef::new(dir.path().join("y.txt.tmp"));
    assert!(!leftover.exists().await);

    assert!(remote.delete().await.unwrap());
    assert!(!remote.exists().await.unwrap());
}

#[tokio::test]
async fn test_directory_probes_and_listing() {
    let dir = TempDir::new().unwrap();
    let source = LocalFileRef::new(dir.path().join("one.csv"));
    tokio::fs::write(source.native(), b"1").await.unwrap();

    let base = root("fref-it-listing").child("logs").unwrap();
    let file = base.child("one.csv").unwrap();
    assert!(file.upload(&source).await.unwrap());

    assert!(base.is_directory().await.unwrap());
    assert!(base.exists().await.unwrap());
    assert!(!file.is_directory().await.unwrap());

    let names: Vec<String> = base
        .list()
        .await
        .unwrap()
        .iter()
        .map(|r| r.name().to_string())
        .collect();
    assert_eq!(names, vec!["one.csv"]);

    assert!(base.delete().await.unwrap());
}

#[tokio::test]
async fn test_backup_copies_alongside_source() {
    let dir = TempDir::new().unwrap();
    let source = LocalFileRef::new(dir.path().join("run.csv"));
    tokio::fs::write(source.native(), b"a,b,c").await.unwrap();

    let remote = root("fref-it-backup")
        .child("logs")
        .unwrap()
        .child("2020")
        .unwrap()
        .child("run.csv")
        .unwrap();
    assert!(remote.upload(&source).await.unwrap());

    assert!(remote.backup().await.unwrap());

    // Source untouched, copy byte-identical under backup/.
    assert!(remote.exists().await.unwrap());
    let copy = remote.parent(1).child("backup").unwrap().child("run.csv").unwrap();
    assert!(copy.exists().await.unwrap());

    let check = LocalFileRef::new(dir.path().join("check.csv"));
    assert!(copy.download(&check, true).await.unwrap());
    assert_eq!(tokio::fs::read(check.native()).await.unwrap(), b"a,b,c");

    assert!(remote.parent(2).delete().await.unwrap());
}

#[tokio::test]
async fn test_missing_object_degrades_without_error() {
    let remote = root("fref-it-missing").child("nope.bin").unwrap();

    assert!(!remote.exists().await.unwrap());

    let dir = TempDir::new().unwrap();
    let target = LocalFileRef::new(dir.path().join("nope.bin"));
    assert!(!remote.download(&target, true).await.unwrap());
    assert!(!target.exists().await);
    let leftover = LocalFileRef::new(dir.path().join("nope.bin.tmp"));
    assert!(!leftover.exists().await);
}

#[tokio::test]
async fn test_find_matching_prefix_search() {
    let dir = TempDir::new().unwrap();
    let source = LocalFileRef::new(dir.path().join("seed"));
    tokio::fs::write(source.native(), b"x").await.unwrap();

    let base = root("fref-it-matching").child("a").unwrap();
    for name in ["b.txt", "backup.txt", "x.txt"] {
        assert!(base.child(name).unwrap().upload(&source).await.unwrap());
    }

    let query = base.child("b").unwrap();
    let mut matches = query.find_matching().await.unwrap();
    matches.sort();
    assert_eq!(matches, vec!["a/b.txt", "a/backup.txt"]);

    assert!(base.delete().await.unwrap());
}
