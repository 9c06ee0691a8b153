//! Predicate family for filesystem records.
//!
//! Every rule doubles as a positive and a negative check through its
//! `expected` flag: `FileSizeRule::new(5, "check_size", false)` matches
//! exactly the records whose size is *not* 5.

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use sha2::{Digest, Sha256};
use vigil_rules::{Priority, Rule, RuleError};

use crate::meta::{FileMeta, keys};

/// Checks whether an entry is a file or a directory.
///
/// Verification drivers add this at [`Priority::HIGHEST`]: if the path is
/// right, the kind of the entry is the cheapest discriminating check and
/// should short-circuit everything else.
pub struct FileEntryRule {
    name: String,
    expected: bool,
    priority: Priority,
    wants_directory: bool,
}

impl FileEntryRule {
    /// Expect the entry to be a regular file.
    #[must_use]
    pub fn file(name: impl Into<String>, expected: bool) -> Self {
        Self {
            name: name.into(),
            expected,
            priority: Priority::LOWEST,
            wants_directory: false,
        }
    }

    /// Expect the entry to be a directory.
    #[must_use]
    pub fn directory(name: impl Into<String>, expected: bool) -> Self {
        Self {
            wants_directory: true,
            ..Self::file(name, expected)
        }
    }

    /// Set the evaluation priority.
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

impl Rule<FileMeta> for FileEntryRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> Priority {
        self.priority
    }

    fn expected(&self) -> bool {
        self.expected
    }

    fn perform_match(&self, meta: &FileMeta) -> Result<bool, RuleError> {
        Ok(meta.is_directory()? == self.wants_directory)
    }

    fn keys(&self) -> Vec<String> {
        vec![keys::IS_DIRECTORY.to_owned()]
    }

    fn description(&self) -> String {
        if self.wants_directory {
            "entry is a directory".to_owned()
        } else {
            "entry is a file".to_owned()
        }
    }
}

/// Compares the entry's full path to an expected path.
pub struct FilePathRule {
    name: String,
    expected: bool,
    path: String,
}

impl FilePathRule {
    /// Expect the entry at exactly `path`.
    #[must_use]
    pub fn new(path: impl Into<String>, name: impl Into<String>, expected: bool) -> Self {
        Self {
            name: name.into(),
            expected,
            path: path.into(),
        }
    }
}

impl Rule<FileMeta> for FilePathRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn expected(&self) -> bool {
        self.expected
    }

    fn perform_match(&self, meta: &FileMeta) -> Result<bool, RuleError> {
        Ok(meta.path()? == self.path)
    }

    fn keys(&self) -> Vec<String> {
        vec![keys::PATH.to_owned()]
    }

    fn description(&self) -> String {
        format!("path equals '{}'", self.path)
    }
}

/// Compares the entry's size in bytes to an expected size.
pub struct FileSizeRule {
    name: String,
    expected: bool,
    size: u64,
}

impl FileSizeRule {
    /// Expect the entry to be exactly `size` bytes.
    #[must_use]
    pub fn new(size: u64, name: impl Into<String>, expected: bool) -> Self {
        Self {
            name: name.into(),
            expected,
            size,
        }
    }
}

impl Rule<FileMeta> for FileSizeRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn expected(&self) -> bool {
        self.expected
    }

    fn perform_match(&self, meta: &FileMeta) -> Result<bool, RuleError> {
        Ok(meta.size()? == self.size)
    }

    fn keys(&self) -> Vec<String> {
        vec![keys::SIZE.to_owned()]
    }

    fn description(&self) -> String {
        format!("size equals {}", self.size)
    }
}

/// Compares the entry's modification time to an expected timestamp.
pub struct FileModtimeRule {
    name: String,
    expected: bool,
    modtime: DateTime<Utc>,
}

impl FileModtimeRule {
    /// Expect the entry to have been modified exactly at `modtime`.
    #[must_use]
    pub fn new(modtime: DateTime<Utc>, name: impl Into<String>, expected: bool) -> Self {
        Self {
            name: name.into(),
            expected,
            modtime,
        }
    }
}

impl Rule<FileMeta> for FileModtimeRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn expected(&self) -> bool {
        self.expected
    }

    fn perform_match(&self, meta: &FileMeta) -> Result<bool, RuleError> {
        Ok(meta.modtime()? == self.modtime)
    }

    fn keys(&self) -> Vec<String> {
        vec![keys::MODTIME.to_owned()]
    }

    fn description(&self) -> String {
        format!(
            "modification time equals {}",
            self.modtime.to_rfc3339_opts(SecondsFormat::Secs, true)
        )
    }
}

/// Compares the entry's owning user id.
pub struct FileUidRule {
    name: String,
    expected: bool,
    uid: i64,
}

impl FileUidRule {
    /// Expect the entry to be owned by `uid`.
    #[must_use]
    pub fn new(uid: i64, name: impl Into<String>, expected: bool) -> Self {
        Self {
            name: name.into(),
            expected,
            uid,
        }
    }
}

impl Rule<FileMeta> for FileUidRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn expected(&self) -> bool {
        self.expected
    }

    fn perform_match(&self, meta: &FileMeta) -> Result<bool, RuleError> {
        Ok(meta.uid()? == self.uid)
    }

    fn keys(&self) -> Vec<String> {
        vec![keys::UID.to_owned()]
    }

    fn description(&self) -> String {
        format!("uid equals {}", self.uid)
    }
}

/// Compares the entry's owning group id.
pub struct FileGidRule {
    name: String,
    expected: bool,
    gid: i64,
}

impl FileGidRule {
    /// Expect the entry to belong to group `gid`.
    #[must_use]
    pub fn new(gid: i64, name: impl Into<String>, expected: bool) -> Self {
        Self {
            name: name.into(),
            expected,
            gid,
        }
    }
}

impl Rule<FileMeta> for FileGidRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn expected(&self) -> bool {
        self.expected
    }

    fn perform_match(&self, meta: &FileMeta) -> Result<bool, RuleError> {
        Ok(meta.gid()? == self.gid)
    }

    fn keys(&self) -> Vec<String> {
        vec![keys::GID.to_owned()]
    }

    fn description(&self) -> String {
        format!("gid equals {}", self.gid)
    }
}

/// Compares the entry's permission bits.
pub struct FilePermRule {
    name: String,
    expected: bool,
    permissions: i64,
}

impl FilePermRule {
    /// Expect the entry to carry exactly these permission bits.
    #[must_use]
    pub fn new(permissions: i64, name: impl Into<String>, expected: bool) -> Self {
        Self {
            name: name.into(),
            expected,
            permissions,
        }
    }
}

impl Rule<FileMeta> for FilePermRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn expected(&self) -> bool {
        self.expected
    }

    fn perform_match(&self, meta: &FileMeta) -> Result<bool, RuleError> {
        Ok(meta.permissions()? == self.permissions)
    }

    fn keys(&self) -> Vec<String> {
        vec![keys::PERMISSIONS.to_owned()]
    }

    fn description(&self) -> String {
        format!("permissions equal {:o}", self.permissions)
    }
}

/// Checks whether the file's content contains an expression.
///
/// Reads the file from disk at evaluation time, so it only runs once the
/// cheaper attribute checks have passed.
pub struct FileContentRule {
    name: String,
    expected: bool,
    expression: String,
    pattern: Option<Regex>,
}

impl FileContentRule {
    /// Expect the content to contain `expression` - a regular expression
    /// when `is_regex` is set, a literal substring otherwise.
    pub fn new(
        expression: impl Into<String>,
        is_regex: bool,
        name: impl Into<String>,
        expected: bool,
    ) -> Result<Self, RuleError> {
        let name = name.into();
        let expression = expression.into();
        let pattern = if is_regex {
            Some(Regex::new(&expression).map_err(|e| RuleError::Evaluation {
                rule: name.clone(),
                message: e.to_string(),
            })?)
        } else {
            None
        };
        Ok(Self {
            name,
            expected,
            expression,
            pattern,
        })
    }
}

impl Rule<FileMeta> for FileContentRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn expected(&self) -> bool {
        self.expected
    }

    fn perform_match(&self, meta: &FileMeta) -> Result<bool, RuleError> {
        let path = meta.path()?;
        let content = std::fs::read_to_string(path).map_err(|e| RuleError::Evaluation {
            rule: self.name.clone(),
            message: format!("unable to read '{path}': {e}"),
        })?;
        Ok(match &self.pattern {
            Some(pattern) => pattern.is_match(&content),
            None => content.contains(&self.expression),
        })
    }

    fn keys(&self) -> Vec<String> {
        vec![keys::PATH.to_owned()]
    }

    fn description(&self) -> String {
        if self.pattern.is_some() {
            format!("content matches expression '{}'", self.expression)
        } else {
            format!("content contains '{}'", self.expression)
        }
    }
}

/// Compares the SHA-256 digest of the file's content.
pub struct FileChecksumRule {
    name: String,
    expected: bool,
    checksum: String,
}

impl FileChecksumRule {
    /// Expect the content digest to equal `checksum` (hex, case-insensitive).
    #[must_use]
    pub fn new(checksum: impl Into<String>, name: impl Into<String>, expected: bool) -> Self {
        Self {
            name: name.into(),
            expected,
            checksum: checksum.into().to_lowercase(),
        }
    }

    /// Hex-encoded SHA-256 digest of a byte slice.
    #[must_use]
    pub fn digest(content: &[u8]) -> String {
        hex::encode(Sha256::digest(content))
    }
}

impl Rule<FileMeta> for FileChecksumRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn expected(&self) -> bool {
        self.expected
    }

    fn perform_match(&self, meta: &FileMeta) -> Result<bool, RuleError> {
        let path = meta.path()?;
        let content = std::fs::read(path).map_err(|e| RuleError::Evaluation {
            rule: self.name.clone(),
            message: format!("unable to read '{path}': {e}"),
        })?;
        Ok(Self::digest(&content) == self.checksum)
    }

    fn keys(&self) -> Vec<String> {
        vec![keys::PATH.to_owned()]
    }

    fn description(&self) -> String {
        format!("checksum equals {}", self.checksum)
    }
}
