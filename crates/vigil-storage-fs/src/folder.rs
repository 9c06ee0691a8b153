//! Filesystem folder and storage factory.

use std::fs;
use std::path::Path;

use regex::Regex;
use vigil_storage::{Matchable, SnapshotState, Storage, StorageError, StorageErrorKind};

use crate::meta::{FileMeta, file_identity};
use crate::term::FileSearchTerm;

/// Backend identifier for error messages.
const BACKEND: &str = "Fs";

/// One polling session against a directory.
///
/// Lists the searched directory on every poll, builds a [`FileMeta`] per
/// matching entry and diffs against the previous poll by identity key.
pub struct FileFolder {
    term: FileSearchTerm,
    pattern: Option<Regex>,
    is_open: bool,
    state: SnapshotState<FileMeta>,
    identity: fn(&FileMeta) -> String,
}

impl FileFolder {
    pub(crate) fn new(term: FileSearchTerm) -> Self {
        Self {
            term,
            pattern: None,
            is_open: false,
            state: SnapshotState::new(),
            identity: file_identity,
        }
    }

    /// Replace the identity function used for snapshot diffing.
    #[must_use]
    pub fn with_identity(mut self, identity: fn(&FileMeta) -> String) -> Self {
        self.identity = identity;
        self
    }

    fn scan(&self) -> Result<Vec<FileMeta>, StorageError> {
        if !self.term.dir().exists() {
            tracing::warn!(
                "{} does not exist, skipping to next poll attempt",
                self.description()
            );
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        self.scan_dir(self.term.dir(), &mut records)?;
        Ok(records)
    }

    fn scan_dir(&self, dir: &Path, records: &mut Vec<FileMeta>) -> Result<(), StorageError> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            // a subdirectory can vanish between listing and descent
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(dir = %dir.display(), "disappeared during poll, skipping");
                return Ok(());
            }
            Err(e) => {
                return Err(StorageError::io(e, self.description()).with_backend(BACKEND));
            }
        };

        for entry in entries {
            let Ok(entry) = entry else {
                continue;
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = entry.path();
            let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());

            if self.name_matches(&name) {
                match entry
                    .metadata()
                    .and_then(|stat| FileMeta::from_entry(&path, &stat))
                {
                    Ok(meta) => records.push(meta),
                    // the entry was removed between listing and stat;
                    // skip it and keep polling
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "unable to build metadata, skipping entry"
                        );
                    }
                }
            }

            if is_dir && self.term.recursive() {
                self.scan_dir(&path, records)?;
            }
        }

        Ok(())
    }

    fn name_matches(&self, name: &str) -> bool {
        match (&self.pattern, self.term.name()) {
            (Some(pattern), _) => pattern.is_match(name),
            (None, Some(expected)) => name == expected,
            (None, None) => true,
        }
    }
}

impl Matchable for FileFolder {
    type Meta = FileMeta;

    fn open(&mut self) -> Result<(), StorageError> {
        if self.is_open {
            return Err(StorageError::already_open(self.description()).with_backend(BACKEND));
        }

        if self.term.is_regex()
            && let Some(name) = self.term.name()
        {
            self.pattern = Some(Regex::new(name).map_err(|e| {
                StorageError::new(StorageErrorKind::InvalidTerm)
                    .with_target(self.description())
                    .with_backend(BACKEND)
                    .with_source(e)
            })?);
        }

        self.is_open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), StorageError> {
        if !self.is_open {
            return Err(StorageError::not_open(self.description()).with_backend(BACKEND));
        }
        self.state.reset();
        self.is_open = false;
        Ok(())
    }

    fn all_meta_data(&mut self) -> Result<Vec<FileMeta>, StorageError> {
        if !self.is_open {
            return Err(StorageError::not_open(self.description()).with_backend(BACKEND));
        }

        let records = self.scan()?;
        let keyed = records
            .into_iter()
            .map(|meta| ((self.identity)(&meta), meta))
            .collect();
        Ok(self.state.ingest(keyed))
    }

    fn new_meta_data(&mut self) -> Result<Vec<FileMeta>, StorageError> {
        self.all_meta_data()?;
        Ok(self.state.new_records())
    }

    fn meta_data_counts(&self) -> Result<String, StorageError> {
        if !self.is_open {
            return Err(StorageError::not_open(self.description()).with_backend(BACKEND));
        }
        Ok(self.state.counts())
    }

    fn description(&self) -> String {
        match self.term.name() {
            None => format!("folder '{}'", self.term.dir().display()),
            Some(name) => format!("file '{}'", self.term.dir().join(name).display()),
        }
    }
}

/// Factory for filesystem folders.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileStorage;

impl FileStorage {
    /// Create a filesystem storage factory.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Storage for FileStorage {
    type Term = FileSearchTerm;
    type Folder = FileFolder;

    fn folder(self, term: FileSearchTerm) -> Result<FileFolder, StorageError> {
        Ok(FileFolder::new(term))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;

    fn open_folder(term: FileSearchTerm) -> FileFolder {
        let mut folder = FileStorage::new().folder(term).unwrap();
        folder.open().unwrap();
        folder
    }

    #[test]
    fn test_open_twice_fails() {
        let temp = tempfile::tempdir().unwrap();
        let mut folder = open_folder(FileSearchTerm::new(temp.path(), None, false, false));

        let err = folder.open().unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::AlreadyOpen);
    }

    #[test]
    fn test_data_ops_require_open() {
        let temp = tempfile::tempdir().unwrap();
        let mut folder = FileFolder::new(FileSearchTerm::new(temp.path(), None, false, false));

        let err = folder.all_meta_data().unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::NotOpen);
    }

    #[test]
    fn test_missing_directory_is_empty_poll() {
        let mut folder = open_folder(FileSearchTerm::new(
            "/nonexistent/tableWithManyRows",
            None,
            false,
            false,
        ));

        let all = folder.all_meta_data().unwrap();
        assert!(all.is_empty());
    }

    #[test]
    fn test_invalid_regex_fails_open() {
        let temp = tempfile::tempdir().unwrap();
        let mut folder = FileFolder::new(FileSearchTerm::new(
            temp.path(),
            Some("[".to_owned()),
            true,
            false,
        ));

        let err = folder.open().unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::InvalidTerm);
    }

    #[test]
    fn test_exact_name_listing() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("report.txt"), "payload").unwrap();
        fs::write(temp.path().join("other.txt"), "noise").unwrap();

        let mut folder = open_folder(FileSearchTerm::new(
            temp.path(),
            Some("report.txt".to_owned()),
            false,
            false,
        ));

        let all = folder.all_meta_data().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name().unwrap(), "report.txt");
        assert_eq!(all[0].size().unwrap(), 7);
    }

    #[test]
    fn test_regex_listing() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("a.csv"), "1").unwrap();
        fs::write(temp.path().join("b.csv"), "2").unwrap();
        fs::write(temp.path().join("c.txt"), "3").unwrap();

        let mut folder = open_folder(FileSearchTerm::new(
            temp.path(),
            Some(r".*\.csv".to_owned()),
            true,
            false,
        ));

        assert_eq!(folder.all_meta_data().unwrap().len(), 2);
    }

    #[test]
    fn test_recursive_listing() {
        let temp = tempfile::tempdir().unwrap();
        let sub = temp.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(temp.path().join("a.txt"), "1").unwrap();
        fs::write(sub.join("b.txt"), "2").unwrap();

        let mut recursive = open_folder(FileSearchTerm::new(
            temp.path(),
            Some(r".*\.txt".to_owned()),
            true,
            true,
        ));
        assert_eq!(recursive.all_meta_data().unwrap().len(), 2);

        let mut flat = open_folder(FileSearchTerm::new(
            temp.path(),
            Some(r".*\.txt".to_owned()),
            true,
            false,
        ));
        assert_eq!(flat.all_meta_data().unwrap().len(), 1);
    }

    #[test]
    fn test_directories_are_records_too() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir(temp.path().join("outbox")).unwrap();

        let mut folder = open_folder(FileSearchTerm::new(
            temp.path(),
            Some("outbox".to_owned()),
            false,
            false,
        ));

        let all = folder.all_meta_data().unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].is_directory().unwrap());
    }

    #[test]
    fn test_unchanged_second_poll_has_no_new_records() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("a.txt"), "1").unwrap();

        let mut folder = open_folder(FileSearchTerm::new(temp.path(), None, false, false));

        assert_eq!(folder.new_meta_data().unwrap().len(), 1);
        assert!(folder.new_meta_data().unwrap().is_empty());
    }

    #[test]
    fn test_new_file_between_polls_is_the_only_new_record() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("a.txt"), "1").unwrap();

        let mut folder = open_folder(FileSearchTerm::new(temp.path(), None, false, false));
        folder.all_meta_data().unwrap();

        fs::write(temp.path().join("b.txt"), "2").unwrap();

        let new = folder.new_meta_data().unwrap();
        assert_eq!(new.len(), 1);
        assert_eq!(new[0].name().unwrap(), "b.txt");
    }

    #[test]
    fn test_close_then_open_forgets_baseline() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("a.txt"), "1").unwrap();

        let mut folder = open_folder(FileSearchTerm::new(temp.path(), None, false, false));
        assert_eq!(folder.new_meta_data().unwrap().len(), 1);

        folder.close().unwrap();
        folder.open().unwrap();

        assert_eq!(folder.new_meta_data().unwrap().len(), 1);
    }

    #[test]
    fn test_counts_and_description() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("a.txt"), "1").unwrap();

        let mut folder = open_folder(FileSearchTerm::new(
            temp.path(),
            Some("a.txt".to_owned()),
            false,
            false,
        ));
        folder.all_meta_data().unwrap();

        assert_eq!(folder.meta_data_counts().unwrap(), "total: 1, new: 1");
        assert!(folder.description().starts_with("file '"));
    }
}
