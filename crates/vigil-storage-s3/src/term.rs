//! Search term for object-store polling.

/// Immutable query descriptor for one bucket target.
///
/// `directory` is the key prefix to poll (empty string for the bucket
/// root, no leading slash). `name` selects the final key component - a
/// regular expression when `is_regex` is set, an exact match otherwise,
/// and every object when absent. With `recursive` unset only objects
/// directly under the directory match.
#[derive(Clone, Debug)]
pub struct ObjectSearchTerm {
    bucket: String,
    directory: String,
    name: Option<String>,
    is_regex: bool,
    recursive: bool,
}

impl ObjectSearchTerm {
    /// Search `bucket` under `directory` for objects named `name`.
    #[must_use]
    pub fn new(
        bucket: impl Into<String>,
        directory: impl Into<String>,
        name: Option<String>,
        is_regex: bool,
        recursive: bool,
    ) -> Self {
        let mut directory = directory.into();
        if !directory.is_empty() && !directory.ends_with('/') {
            directory.push('/');
        }
        Self {
            bucket: bucket.into(),
            directory,
            name,
            is_regex,
            recursive,
        }
    }

    /// The bucket to poll.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// The key prefix to poll, normalized to end in `/` unless empty.
    #[must_use]
    pub fn directory(&self) -> &str {
        &self.directory
    }

    /// The expected object name or pattern, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether [`name`](Self::name) is a regular expression.
    #[must_use]
    pub fn is_regex(&self) -> bool {
        self.is_regex
    }

    /// Whether nested keys match too.
    #[must_use]
    pub fn recursive(&self) -> bool {
        self.recursive
    }
}
