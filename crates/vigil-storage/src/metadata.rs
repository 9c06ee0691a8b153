//! Observation records exchanged between storage folders and rules.
//!
//! A [`MetaData`] is built fresh from one raw backend record on every poll
//! cycle and discarded at the next poll. Identity keys used for snapshot
//! diffing are computed by the owning folder and are never part of the bag.

use chrono::{DateTime, SecondsFormat, Utc};

/// A single typed attribute value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// UTF-8 text.
    Str(String),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Boolean flag.
    Bool(bool),
    /// Point in time (UTC).
    Time(DateTime<Utc>),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Explicit absence (e.g. a SQL NULL column).
    Null,
}

impl Value {
    /// Human-readable name of the variant, used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Bool(_) => "boolean",
            Value::Time(_) => "time",
            Value::Bytes(_) => "bytes",
            Value::Null => "null",
        }
    }

    /// Borrow the value as text, if it is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Read the value as an integer, if it is one.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Read the value as a boolean, if it is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Read the value as a timestamp, if it is one.
    #[must_use]
    pub fn as_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Time(t) => Some(*t),
            _ => None,
        }
    }

    /// Borrow the value as raw bytes, if it is one.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Time(t) => f.write_str(&t.to_rfc3339_opts(SecondsFormat::Secs, true)),
            Value::Bytes(b) => {
                // hex would be nicer to read but pulls a dependency into a
                // types-only module; length is enough for log lines
                write!(f, "<{} bytes>", b.len())
            }
            Value::Null => f.write_str("null"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Time(t)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

/// An insertion-ordered bag of named attribute values.
///
/// Keys are backend-specific (column names for a database row, file
/// attributes for a filesystem entry, object attributes for a blob).
/// `put_property` overwrites in place (last write wins), so iteration
/// order is the order of first insertion - database folders rely on this
/// for order-stable identity hashing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetaData {
    entries: Vec<(String, Value)>,
}

impl MetaData {
    /// Create an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value under `key`, overwriting any previous value.
    pub fn put_property(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Look up the value stored under `key`.
    #[must_use]
    pub fn get_property(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Iterate over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Iterate over `(key, value)` pairs in insertion order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of stored properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no properties are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AsRef<MetaData> for MetaData {
    fn as_ref(&self) -> &MetaData {
        self
    }
}

impl std::fmt::Display for MetaData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (key, value) in &self.entries {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{key}={value}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_put_and_get() {
        let mut meta = MetaData::new();
        meta.put_property("name", "report.txt");
        meta.put_property("size", 42i64);

        assert_eq!(meta.get_property("name"), Some(&Value::Str("report.txt".to_owned())));
        assert_eq!(meta.get_property("size"), Some(&Value::Int(42)));
        assert_eq!(meta.get_property("missing"), None);
    }

    #[test]
    fn test_put_overwrites_in_place() {
        let mut meta = MetaData::new();
        meta.put_property("a", 1i64);
        meta.put_property("b", 2i64);
        meta.put_property("a", 3i64);

        assert_eq!(meta.get_property("a"), Some(&Value::Int(3)));
        // overwriting must not disturb insertion order
        let keys: Vec<_> = meta.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(meta.len(), 2);
    }

    #[test]
    fn test_keys_preserve_insertion_order() {
        let mut meta = MetaData::new();
        meta.put_property("z", 1i64);
        meta.put_property("a", 2i64);
        meta.put_property("m", 3i64);

        let keys: Vec<_> = meta.keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_display_joins_properties() {
        let mut meta = MetaData::new();
        meta.put_property("name", "a.txt");
        meta.put_property("size", 7i64);

        assert_eq!(meta.to_string(), "name=a.txt, size=7");
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Str("x".to_owned()).as_str(), Some("x"));
        assert_eq!(Value::Int(5).as_int(), Some(5));
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Int(5).as_str(), None);
        assert_eq!(Value::Bytes(vec![1, 2]).as_bytes(), Some(&[1u8, 2][..]));
    }

    #[test]
    fn test_value_type_names() {
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::Float(0.5).type_name(), "float");
        assert_eq!(Value::from("s").type_name(), "string");
    }

    #[test]
    fn test_empty_bag() {
        let meta = MetaData::new();
        assert!(meta.is_empty());
        assert_eq!(meta.to_string(), "");
    }
}
