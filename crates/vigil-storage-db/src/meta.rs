//! Database observation records.

use sha2::{Digest, Sha256};
use vigil_rules::{RuleError, props};
use vigil_storage::{MetaData, Value};

use crate::provider::DbRow;

/// One observed result row.
///
/// Property keys are the column names of the result set, in column order.
#[derive(Clone, Debug, PartialEq)]
pub struct DbMeta {
    inner: MetaData,
}

impl DbMeta {
    /// Wrap an existing property bag.
    #[must_use]
    pub fn new(inner: MetaData) -> Self {
        Self { inner }
    }

    /// Build a record from one result row.
    #[must_use]
    pub fn from_row(row: DbRow) -> Self {
        let mut inner = MetaData::new();
        for (column, value) in row {
            inner.put_property(column, value);
        }
        Self { inner }
    }

    /// The value of one column.
    pub fn field(&self, column: &str) -> Result<&Value, RuleError> {
        props::require(&self.inner, column)
    }
}

impl AsRef<MetaData> for DbMeta {
    fn as_ref(&self) -> &MetaData {
        &self.inner
    }
}

impl std::fmt::Display for DbMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inner.fmt(f)
    }
}

/// Default identity function for database rows.
///
/// Digest over every column name and value in column order - stable across
/// polls of an unchanged row as long as column order is stable, different
/// whenever any value changes. Only this digest is retained between polls,
/// never the rows themselves.
#[must_use]
pub fn db_identity(meta: &DbMeta) -> String {
    let mut hasher = Sha256::new();
    for (column, value) in meta.as_ref().properties() {
        hasher.update(column.as_bytes());
        hasher.update([0u8]);
        match value {
            // raw bytes feed the digest directly; everything else goes in
            // through its canonical text form
            Value::Bytes(bytes) => hasher.update(bytes),
            other => hasher.update(other.to_string().as_bytes()),
        }
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}
