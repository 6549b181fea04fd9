//! fr-s3: object-storage backend for fileref
//!
//! Implements the `FileRef` trait on top of aws-sdk-s3. It is the only
//! crate that directly depends on the AWS SDK; one client is created
//! lazily per bucket-scoped `ObjectStorage` value and cached for its
//! lifetime.

pub mod client;
pub mod fileref;

pub use client::{is_transient_storage, normalize_key, KeyParts, ObjectStorage};
pub use fileref::S3FileRef;
