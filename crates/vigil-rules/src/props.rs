//! Typed property lookups used by backend rule implementations.
//!
//! A rule that inspects a property either gets the type it declared or
//! raises a [`RuleError`] - a mismatch is a configuration error, never a
//! silent non-match.

use chrono::{DateTime, Utc};
use vigil_storage::{MetaData, Value};

use crate::rule::RuleError;

/// Fetch a property or fail with [`RuleError::MissingProperty`].
pub fn require<'a>(meta: &'a MetaData, key: &str) -> Result<&'a Value, RuleError> {
    meta.get_property(key)
        .ok_or_else(|| RuleError::MissingProperty(key.to_owned()))
}

/// Fetch a text property.
pub fn require_str<'a>(meta: &'a MetaData, key: &str) -> Result<&'a str, RuleError> {
    require(meta, key)?
        .as_str()
        .ok_or_else(|| RuleError::WrongType {
            key: key.to_owned(),
            expected: "string",
        })
}

/// Fetch an integer property.
pub fn require_int(meta: &MetaData, key: &str) -> Result<i64, RuleError> {
    require(meta, key)?
        .as_int()
        .ok_or_else(|| RuleError::WrongType {
            key: key.to_owned(),
            expected: "integer",
        })
}

/// Fetch a boolean property.
pub fn require_bool(meta: &MetaData, key: &str) -> Result<bool, RuleError> {
    require(meta, key)?
        .as_bool()
        .ok_or_else(|| RuleError::WrongType {
            key: key.to_owned(),
            expected: "boolean",
        })
}

/// Fetch a timestamp property.
pub fn require_time(meta: &MetaData, key: &str) -> Result<DateTime<Utc>, RuleError> {
    require(meta, key)?
        .as_time()
        .ok_or_else(|| RuleError::WrongType {
            key: key.to_owned(),
            expected: "time",
        })
}

/// Fetch a raw-bytes property.
pub fn require_bytes<'a>(meta: &'a MetaData, key: &str) -> Result<&'a [u8], RuleError> {
    require(meta, key)?
        .as_bytes()
        .ok_or_else(|| RuleError::WrongType {
            key: key.to_owned(),
            expected: "bytes",
        })
}
