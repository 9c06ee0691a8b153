//! Predicate family for object-store records.

use chrono::{DateTime, SecondsFormat, Utc};
use vigil_rules::{Priority, Rule, RuleError};

use crate::meta::{ObjectMeta, keys};

/// Checks whether a key is an object or a directory marker.
///
/// Verification drivers add this at [`Priority::HIGHEST`] so it
/// short-circuits the attribute checks.
pub struct ObjectEntryRule {
    name: String,
    expected: bool,
    priority: Priority,
    wants_directory: bool,
}

impl ObjectEntryRule {
    /// Expect the key to be a regular object.
    #[must_use]
    pub fn object(name: impl Into<String>, expected: bool) -> Self {
        Self {
            name: name.into(),
            expected,
            priority: Priority::LOWEST,
            wants_directory: false,
        }
    }

    /// Expect the key to be a directory marker.
    #[must_use]
    pub fn directory(name: impl Into<String>, expected: bool) -> Self {
        Self {
            wants_directory: true,
            ..Self::object(name, expected)
        }
    }

    /// Set the evaluation priority.
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

impl Rule<ObjectMeta> for ObjectEntryRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> Priority {
        self.priority
    }

    fn expected(&self) -> bool {
        self.expected
    }

    fn perform_match(&self, meta: &ObjectMeta) -> Result<bool, RuleError> {
        Ok(meta.is_directory()? == self.wants_directory)
    }

    fn keys(&self) -> Vec<String> {
        vec![keys::IS_DIRECTORY.to_owned()]
    }

    fn description(&self) -> String {
        if self.wants_directory {
            "key is a directory marker".to_owned()
        } else {
            "key is an object".to_owned()
        }
    }
}

/// Compares the object's size in bytes.
pub struct ObjectSizeRule {
    name: String,
    expected: bool,
    size: i64,
}

impl ObjectSizeRule {
    /// Expect the object to be exactly `size` bytes.
    #[must_use]
    pub fn new(size: i64, name: impl Into<String>, expected: bool) -> Self {
        Self {
            name: name.into(),
            expected,
            size,
        }
    }
}

impl Rule<ObjectMeta> for ObjectSizeRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn expected(&self) -> bool {
        self.expected
    }

    fn perform_match(&self, meta: &ObjectMeta) -> Result<bool, RuleError> {
        Ok(meta.size()? == self.size)
    }

    fn keys(&self) -> Vec<String> {
        vec![keys::SIZE.to_owned()]
    }

    fn description(&self) -> String {
        format!("size equals {}", self.size)
    }
}

/// Compares the object's last-modified timestamp.
pub struct ObjectModtimeRule {
    name: String,
    expected: bool,
    modtime: DateTime<Utc>,
}

impl ObjectModtimeRule {
    /// Expect the object to have been modified exactly at `modtime`.
    #[must_use]
    pub fn new(modtime: DateTime<Utc>, name: impl Into<String>, expected: bool) -> Self {
        Self {
            name: name.into(),
            expected,
            modtime,
        }
    }
}

impl Rule<ObjectMeta> for ObjectModtimeRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn expected(&self) -> bool {
        self.expected
    }

    fn perform_match(&self, meta: &ObjectMeta) -> Result<bool, RuleError> {
        Ok(meta.modtime()? == self.modtime)
    }

    fn keys(&self) -> Vec<String> {
        vec![keys::MODTIME.to_owned()]
    }

    fn description(&self) -> String {
        format!(
            "last-modified equals {}",
            self.modtime.to_rfc3339_opts(SecondsFormat::Secs, true)
        )
    }
}

/// Compares the object's entity tag (case-insensitive, ignoring quotes).
pub struct ObjectEtagRule {
    name: String,
    expected: bool,
    etag: String,
}

impl ObjectEtagRule {
    /// Expect the object's entity tag to equal `etag`.
    #[must_use]
    pub fn new(etag: impl Into<String>, name: impl Into<String>, expected: bool) -> Self {
        Self {
            name: name.into(),
            expected,
            etag: etag.into().trim_matches('"').to_lowercase(),
        }
    }
}

impl Rule<ObjectMeta> for ObjectEtagRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn expected(&self) -> bool {
        self.expected
    }

    fn perform_match(&self, meta: &ObjectMeta) -> Result<bool, RuleError> {
        Ok(meta.etag()?.to_lowercase() == self.etag)
    }

    fn keys(&self) -> Vec<String> {
        vec![keys::ETAG.to_owned()]
    }

    fn description(&self) -> String {
        format!("etag equals {}", self.etag)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::client::ObjectRecord;

    use super::*;

    fn meta(key: &str) -> ObjectMeta {
        ObjectMeta::from_record(
            "drop",
            &ObjectRecord {
                key: key.to_owned(),
                size: 42,
                last_modified: "2026-01-05T10:00:00Z".parse().unwrap(),
                etag: "AB12cd".to_owned(),
            },
        )
    }

    #[test]
    fn test_entry_rule() {
        let object_rule = ObjectEntryRule::object("check_is_object", true);

        assert!(object_rule.matches(&meta("a.txt")).unwrap());
        assert!(!object_rule.matches(&meta("sub/")).unwrap());
        assert!(ObjectEntryRule::directory("check_is_directory", true)
            .matches(&meta("sub/"))
            .unwrap());
    }

    #[test]
    fn test_entry_rule_priority() {
        let rule = ObjectEntryRule::object("check", true).with_priority(Priority::HIGHEST);
        assert_eq!(rule.priority(), Priority::HIGHEST);
    }

    #[test]
    fn test_size_rule() {
        assert!(ObjectSizeRule::new(42, "check_size", true).matches(&meta("a.txt")).unwrap());
        assert!(ObjectSizeRule::new(41, "check_size_different", false)
            .matches(&meta("a.txt"))
            .unwrap());
    }

    #[test]
    fn test_modtime_rule() {
        let at = "2026-01-05T10:00:00Z".parse().unwrap();
        assert!(ObjectModtimeRule::new(at, "check_modtime", true).matches(&meta("a.txt")).unwrap());
    }

    #[test]
    fn test_etag_rule_ignores_case_and_quotes() {
        assert!(ObjectEtagRule::new("\"ab12CD\"", "check_etag", true)
            .matches(&meta("a.txt"))
            .unwrap());
        assert!(!ObjectEtagRule::new("ffff", "check_etag", true).matches(&meta("a.txt")).unwrap());
    }
}
