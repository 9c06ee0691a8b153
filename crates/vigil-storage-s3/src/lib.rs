//! S3 object storage backend for the Vigil verification engine.
//!
//! Polls an S3-compatible bucket for objects matching an
//! [`ObjectSearchTerm`] and exposes them as [`ObjectMeta`] records through
//! the [`Matchable`](vigil_storage::Matchable) contract. A bucket that does
//! not exist yet is an empty poll, not an error.
//!
//! The actual store client sits behind the narrow [`ObjectClient`] trait;
//! [`AwsObjectClient`] implements it with the AWS SDK (default credentials
//! chain, optional custom endpoint with path-style addressing for MinIO
//! and LocalStack). A scripted [`MockObjectClient`] is available behind the
//! `mock` feature flag.

mod aws;
mod client;
mod folder;
mod meta;
#[cfg(feature = "mock")]
mod mock;
pub mod rules;
mod term;

pub use aws::AwsObjectClient;
pub use client::{ObjectClient, ObjectRecord};
pub use folder::{ObjectFolder, ObjectStorage};
pub use meta::{ObjectMeta, keys, object_identity};
#[cfg(feature = "mock")]
pub use mock::MockObjectClient;
pub use term::ObjectSearchTerm;
