//! Object-store observation records.

use chrono::{DateTime, Utc};
use vigil_rules::{RuleError, props};
use vigil_storage::MetaData;

use crate::client::ObjectRecord;

/// Canonical property keys of an [`ObjectMeta`] record.
pub mod keys {
    /// Bucket holding the object.
    pub const BUCKET: &str = "bucket";
    /// Full object key.
    pub const KEY: &str = "key";
    /// Final key component.
    pub const NAME: &str = "name";
    /// Size in bytes.
    pub const SIZE: &str = "size";
    /// Last-modified timestamp.
    pub const MODTIME: &str = "modtime";
    /// Entity tag.
    pub const ETAG: &str = "etag";
    /// Whether the key is a directory marker (ends in `/`).
    pub const IS_DIRECTORY: &str = "is_directory";
}

/// One observed object.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectMeta {
    inner: MetaData,
}

impl ObjectMeta {
    /// Wrap an existing property bag.
    #[must_use]
    pub fn new(inner: MetaData) -> Self {
        Self { inner }
    }

    /// Build a record from a raw listing entry.
    #[must_use]
    pub fn from_record(bucket: &str, record: &ObjectRecord) -> Self {
        let trimmed = record.key.trim_end_matches('/');
        let name = trimmed.rsplit('/').next().unwrap_or(trimmed);

        let mut inner = MetaData::new();
        inner.put_property(keys::BUCKET, bucket);
        inner.put_property(keys::KEY, record.key.as_str());
        inner.put_property(keys::NAME, name);
        inner.put_property(keys::SIZE, record.size);
        inner.put_property(keys::MODTIME, record.last_modified);
        inner.put_property(keys::ETAG, record.etag.as_str());
        inner.put_property(keys::IS_DIRECTORY, record.key.ends_with('/'));
        Self { inner }
    }

    /// Bucket holding the object.
    pub fn bucket(&self) -> Result<&str, RuleError> {
        props::require_str(&self.inner, keys::BUCKET)
    }

    /// Full object key.
    pub fn key(&self) -> Result<&str, RuleError> {
        props::require_str(&self.inner, keys::KEY)
    }

    /// Final key component.
    pub fn name(&self) -> Result<&str, RuleError> {
        props::require_str(&self.inner, keys::NAME)
    }

    /// Size in bytes.
    pub fn size(&self) -> Result<i64, RuleError> {
        props::require_int(&self.inner, keys::SIZE)
    }

    /// Last-modified timestamp.
    pub fn modtime(&self) -> Result<DateTime<Utc>, RuleError> {
        props::require_time(&self.inner, keys::MODTIME)
    }

    /// Entity tag.
    pub fn etag(&self) -> Result<&str, RuleError> {
        props::require_str(&self.inner, keys::ETAG)
    }

    /// Whether the key is a directory marker.
    pub fn is_directory(&self) -> Result<bool, RuleError> {
        props::require_bool(&self.inner, keys::IS_DIRECTORY)
    }
}

impl AsRef<MetaData> for ObjectMeta {
    fn as_ref(&self) -> &MetaData {
        &self.inner
    }
}

impl std::fmt::Display for ObjectMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inner.fmt(f)
    }
}

/// Default identity function for object records: key plus last-modified
/// timestamp.
#[must_use]
pub fn object_identity(meta: &ObjectMeta) -> String {
    let bag = meta.as_ref();
    let prop = |key: &str| {
        bag.get_property(key)
            .map(ToString::to_string)
            .unwrap_or_default()
    };
    format!("{}.{}", prop(keys::KEY), prop(keys::MODTIME))
}
