//! Search term for filesystem polling.

use std::path::{Path, PathBuf};

/// Immutable query descriptor for one filesystem target.
///
/// Owned by the verification driver and handed once to
/// [`FileStorage`](crate::FileStorage) to construct a folder.
#[derive(Clone, Debug)]
pub struct FileSearchTerm {
    dir: PathBuf,
    name: Option<String>,
    is_regex: bool,
    recursive: bool,
}

impl FileSearchTerm {
    /// Search `dir` for entries named `name`.
    ///
    /// With `name = None` every entry matches. With `is_regex = true` the
    /// name is a regular expression applied to entry names, otherwise an
    /// exact match. With `recursive = true` subdirectories are descended
    /// into.
    #[must_use]
    pub fn new(
        dir: impl Into<PathBuf>,
        name: Option<String>,
        is_regex: bool,
        recursive: bool,
    ) -> Self {
        Self {
            dir: dir.into(),
            name,
            is_regex,
            recursive,
        }
    }

    /// Search for exactly the given file or folder path.
    ///
    /// The parent becomes the searched directory and the final component
    /// the exact expected name.
    #[must_use]
    pub fn exact(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        Self::new(dir, name, false, false)
    }

    /// The directory to poll.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The expected entry name or pattern, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether [`name`](Self::name) is a regular expression.
    #[must_use]
    pub fn is_regex(&self) -> bool {
        self.is_regex
    }

    /// Whether subdirectories are searched too.
    #[must_use]
    pub fn recursive(&self) -> bool {
        self.recursive
    }
}
