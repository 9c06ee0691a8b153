//! Filesystem observation records.

use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use vigil_rules::{RuleError, props};
use vigil_storage::MetaData;

/// Canonical property keys of a [`FileMeta`] record.
pub mod keys {
    /// Full path of the entry.
    pub const PATH: &str = "path";
    /// Final path component.
    pub const NAME: &str = "name";
    /// Size in bytes.
    pub const SIZE: &str = "size";
    /// Last modification time.
    pub const MODTIME: &str = "modtime";
    /// Whether the entry is a directory.
    pub const IS_DIRECTORY: &str = "is_directory";
    /// Owning user id (0 on non-unix hosts).
    pub const UID: &str = "uid";
    /// Owning group id (0 on non-unix hosts).
    pub const GID: &str = "gid";
    /// Permission bits (0 on non-unix hosts).
    pub const PERMISSIONS: &str = "permissions";
}

/// One observed filesystem entry.
///
/// Built fresh from a directory listing on every poll and immutable after
/// construction. Rules read the canonical [`keys`] through the typed
/// accessors.
#[derive(Clone, Debug, PartialEq)]
pub struct FileMeta {
    inner: MetaData,
}

impl FileMeta {
    /// Wrap an existing property bag.
    ///
    /// Useful for tests; folders normally build records via the listing.
    #[must_use]
    pub fn new(inner: MetaData) -> Self {
        Self { inner }
    }

    /// Build a record from a path and its stat data.
    pub(crate) fn from_entry(path: &Path, stat: &std::fs::Metadata) -> io::Result<Self> {
        let modified: DateTime<Utc> = stat.modified()?.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut inner = MetaData::new();
        inner.put_property(keys::PATH, path.to_string_lossy().into_owned());
        inner.put_property(keys::NAME, name);
        inner.put_property(keys::SIZE, i64::try_from(stat.len()).unwrap_or(i64::MAX));
        inner.put_property(keys::MODTIME, modified);
        inner.put_property(keys::IS_DIRECTORY, stat.is_dir());

        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            inner.put_property(keys::UID, stat.uid());
            inner.put_property(keys::GID, stat.gid());
            inner.put_property(keys::PERMISSIONS, stat.mode() & 0o7777);
        }
        #[cfg(not(unix))]
        {
            inner.put_property(keys::UID, 0u32);
            inner.put_property(keys::GID, 0u32);
            inner.put_property(keys::PERMISSIONS, 0u32);
        }

        Ok(Self { inner })
    }

    /// Full path of the entry.
    pub fn path(&self) -> Result<&str, RuleError> {
        props::require_str(&self.inner, keys::PATH)
    }

    /// Final path component.
    pub fn name(&self) -> Result<&str, RuleError> {
        props::require_str(&self.inner, keys::NAME)
    }

    /// Size in bytes.
    pub fn size(&self) -> Result<u64, RuleError> {
        let size = props::require_int(&self.inner, keys::SIZE)?;
        u64::try_from(size).map_err(|_| RuleError::WrongType {
            key: keys::SIZE.to_owned(),
            expected: "non-negative integer",
        })
    }

    /// Last modification time.
    pub fn modtime(&self) -> Result<DateTime<Utc>, RuleError> {
        props::require_time(&self.inner, keys::MODTIME)
    }

    /// Whether the entry is a directory.
    pub fn is_directory(&self) -> Result<bool, RuleError> {
        props::require_bool(&self.inner, keys::IS_DIRECTORY)
    }

    /// Owning user id.
    pub fn uid(&self) -> Result<i64, RuleError> {
        props::require_int(&self.inner, keys::UID)
    }

    /// Owning group id.
    pub fn gid(&self) -> Result<i64, RuleError> {
        props::require_int(&self.inner, keys::GID)
    }

    /// Permission bits.
    pub fn permissions(&self) -> Result<i64, RuleError> {
        props::require_int(&self.inner, keys::PERMISSIONS)
    }
}

impl AsRef<MetaData> for FileMeta {
    fn as_ref(&self) -> &MetaData {
        &self.inner
    }
}

impl std::fmt::Display for FileMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inner.fmt(f)
    }
}

/// Default identity function for filesystem records.
///
/// Combines path, modification time and ownership so the identity changes
/// whenever any of those observed attributes change, while staying stable
/// across polls of an unchanged entry.
#[must_use]
pub fn file_identity(meta: &FileMeta) -> String {
    let bag = meta.as_ref();
    let prop = |key: &str| {
        bag.get_property(key)
            .map(ToString::to_string)
            .unwrap_or_default()
    };
    format!(
        "{}.{}.{}.{}",
        prop(keys::PATH),
        prop(keys::MODTIME),
        prop(keys::UID),
        prop(keys::GID),
    )
}
