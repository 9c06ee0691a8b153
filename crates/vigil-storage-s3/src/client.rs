//! The narrow object-store client contract.

use chrono::{DateTime, Utc};
use vigil_storage::StorageError;

/// One raw object listing entry.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectRecord {
    /// Full object key within the bucket.
    pub key: String,
    /// Object size in bytes.
    pub size: i64,
    /// Last-modified timestamp.
    pub last_modified: DateTime<Utc>,
    /// Entity tag, without surrounding quotes.
    pub etag: String,
}

/// What the verification core needs from an object-store client: list one
/// bucket under one prefix, report a missing bucket distinctly from a
/// failure, and describe the endpoint for log lines.
///
/// Protocol, authentication and retry concerns live behind this trait.
pub trait ObjectClient {
    /// List every object under `prefix` in `bucket`.
    ///
    /// Returns `None` when the bucket does not exist (yet) - the caller
    /// treats that as an empty poll. A genuine backend failure is a
    /// [`StorageError`].
    fn list(&self, bucket: &str, prefix: &str) -> Result<Option<Vec<ObjectRecord>>, StorageError>;

    /// Human-readable description of the store endpoint.
    fn description(&self) -> String;
}
