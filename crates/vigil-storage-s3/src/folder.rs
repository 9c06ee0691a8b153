//! Object-store folder and storage factory.

use regex::Regex;
use vigil_storage::{Matchable, SnapshotState, Storage, StorageError, StorageErrorKind};

use crate::client::{ObjectClient, ObjectRecord};
use crate::meta::{ObjectMeta, object_identity};
use crate::term::ObjectSearchTerm;

/// Backend identifier for error messages.
const BACKEND: &str = "S3";

/// One polling session against a bucket prefix.
///
/// Lists the prefix on every poll, filters keys against the search term
/// and diffs against the previous poll by key + last-modified identity.
pub struct ObjectFolder<C> {
    client: C,
    term: ObjectSearchTerm,
    pattern: Option<Regex>,
    is_open: bool,
    state: SnapshotState<ObjectMeta>,
    identity: fn(&ObjectMeta) -> String,
}

impl<C: ObjectClient> ObjectFolder<C> {
    pub(crate) fn new(client: C, term: ObjectSearchTerm) -> Self {
        Self {
            client,
            term,
            pattern: None,
            is_open: false,
            state: SnapshotState::new(),
            identity: object_identity,
        }
    }

    /// Replace the identity function used for snapshot diffing.
    #[must_use]
    pub fn with_identity(mut self, identity: fn(&ObjectMeta) -> String) -> Self {
        self.identity = identity;
        self
    }

    /// Whether a listed key is selected by the search term.
    fn selects(&self, record: &ObjectRecord) -> bool {
        let Some(relative) = record.key.strip_prefix(self.term.directory()) else {
            return false;
        };
        if relative.is_empty() {
            // the prefix marker object itself
            return false;
        }
        if !self.term.recursive() && relative.trim_end_matches('/').contains('/') {
            return false;
        }

        let trimmed = relative.trim_end_matches('/');
        let name = trimmed.rsplit('/').next().unwrap_or(trimmed);
        match (&self.pattern, self.term.name()) {
            (Some(pattern), _) => pattern.is_match(name),
            (None, Some(expected)) => name == expected,
            (None, None) => true,
        }
    }
}

impl<C: ObjectClient> Matchable for ObjectFolder<C> {
    type Meta = ObjectMeta;

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

    fn all_meta_data(&mut self) -> Result<Vec<ObjectMeta>, StorageError> {
        if !self.is_open {
            return Err(StorageError::not_open(self.description()).with_backend(BACKEND));
        }

        let Some(listing) = self
            .client
            .list(self.term.bucket(), self.term.directory())?
        else {
            tracing::warn!(
                "{} does not exist, skipping to next poll attempt",
                self.description()
            );
            return Ok(self.state.ingest(Vec::new()));
        };

        let keyed = listing
            .iter()
            .filter(|record| self.selects(record))
            .map(|record| {
                let meta = ObjectMeta::from_record(self.term.bucket(), record);
                ((self.identity)(&meta), meta)
            })
            .collect();
        Ok(self.state.ingest(keyed))
    }

    fn new_meta_data(&mut self) -> Result<Vec<ObjectMeta>, StorageError> {
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
        let target = match self.term.name() {
            Some(name) => format!(
                "object '{}{}' in bucket '{}'",
                self.term.directory(),
                name,
                self.term.bucket()
            ),
            None => format!(
                "prefix '{}' in bucket '{}'",
                self.term.directory(),
                self.term.bucket()
            ),
        };
        format!("{} on {}", target, self.client.description())
    }
}

/// Factory for object-store folders.
pub struct ObjectStorage<C> {
    client: C,
}

impl<C: ObjectClient> ObjectStorage<C> {
    /// Create a storage factory around one store client.
    #[must_use]
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

impl<C: ObjectClient> Storage for ObjectStorage<C> {
    type Term = ObjectSearchTerm;
    type Folder = ObjectFolder<C>;

    fn folder(self, term: ObjectSearchTerm) -> Result<ObjectFolder<C>, StorageError> {
        Ok(ObjectFolder::new(self.client, term))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use chrono::{DateTime, Utc};
    use pretty_assertions::assert_eq;

    use super::*;

    struct ScriptedClient {
        polls: RefCell<VecDeque<Option<Vec<ObjectRecord>>>>,
        last: RefCell<Option<Vec<ObjectRecord>>>,
    }

    impl ScriptedClient {
        fn new(polls: Vec<Option<Vec<ObjectRecord>>>) -> Self {
            Self {
                polls: RefCell::new(polls.into()),
                last: RefCell::new(Some(Vec::new())),
            }
        }
    }

    impl ObjectClient for ScriptedClient {
        fn list(
            &self,
            _bucket: &str,
            _prefix: &str,
        ) -> Result<Option<Vec<ObjectRecord>>, StorageError> {
            match self.polls.borrow_mut().pop_front() {
                Some(listing) => {
                    self.last.borrow_mut().clone_from(&listing);
                    Ok(listing)
                }
                None => Ok(self.last.borrow().clone()),
            }
        }

        fn description(&self) -> String {
            "object store at 'scripted'".to_owned()
        }
    }

    fn record(key: &str, modified: &str) -> ObjectRecord {
        ObjectRecord {
            key: key.to_owned(),
            size: 7,
            last_modified: modified.parse::<DateTime<Utc>>().unwrap(),
            etag: "abc".to_owned(),
        }
    }

    fn open_folder(term: ObjectSearchTerm, polls: Vec<Option<Vec<ObjectRecord>>>) -> ObjectFolder<ScriptedClient> {
        let storage = ObjectStorage::new(ScriptedClient::new(polls));
        let mut folder = storage.folder(term).unwrap();
        folder.open().unwrap();
        folder
    }

    #[test]
    fn test_missing_bucket_is_empty_poll() {
        let term = ObjectSearchTerm::new("drop", "", None, false, false);
        let mut folder = open_folder(term, vec![None]);

        assert!(folder.all_meta_data().unwrap().is_empty());
    }

    #[test]
    fn test_prefix_filtering_non_recursive() {
        let term = ObjectSearchTerm::new("drop", "incoming", None, false, false);
        let listing = vec![
            record("incoming/a.txt", "2026-01-05T10:00:00Z"),
            record("incoming/sub/", "2026-01-05T10:00:00Z"),
            record("incoming/sub/nested.txt", "2026-01-05T10:00:00Z"),
        ];
        let mut folder = open_folder(term, vec![Some(listing)]);

        let all = folder.all_meta_data().unwrap();
        let names: Vec<_> = all.iter().map(|m| m.name().unwrap().to_owned()).collect();

        // the direct object and the directory marker, but not the nested key
        assert_eq!(all.len(), 2);
        assert!(names.contains(&"a.txt".to_owned()));
        assert!(names.contains(&"sub".to_owned()));
    }

    #[test]
    fn test_recursive_includes_nested_keys() {
        let term = ObjectSearchTerm::new("drop", "incoming", Some(r".*\.txt".to_owned()), true, true);
        let listing = vec![
            record("incoming/a.txt", "2026-01-05T10:00:00Z"),
            record("incoming/sub/nested.txt", "2026-01-05T10:00:00Z"),
        ];
        let mut folder = open_folder(term, vec![Some(listing)]);

        assert_eq!(folder.all_meta_data().unwrap().len(), 2);
    }

    #[test]
    fn test_exact_name_match() {
        let term = ObjectSearchTerm::new("drop", "", Some("report.txt".to_owned()), false, false);
        let listing = vec![
            record("report.txt", "2026-01-05T10:00:00Z"),
            record("other.txt", "2026-01-05T10:00:00Z"),
        ];
        let mut folder = open_folder(term, vec![Some(listing)]);

        let all = folder.all_meta_data().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].key().unwrap(), "report.txt");
    }

    #[test]
    fn test_touched_object_is_new_again() {
        let term = ObjectSearchTerm::new("drop", "", None, false, false);
        let mut folder = open_folder(
            term,
            vec![
                Some(vec![record("a.txt", "2026-01-05T10:00:00Z")]),
                Some(vec![record("a.txt", "2026-01-05T10:05:00Z")]),
            ],
        );

        folder.all_meta_data().unwrap();
        let new = folder.new_meta_data().unwrap();

        assert_eq!(new.len(), 1);
    }

    #[test]
    fn test_unchanged_listing_has_no_new_records() {
        let term = ObjectSearchTerm::new("drop", "", None, false, false);
        let mut folder = open_folder(
            term,
            vec![Some(vec![record("a.txt", "2026-01-05T10:00:00Z")])],
        );

        folder.all_meta_data().unwrap();
        assert!(folder.new_meta_data().unwrap().is_empty());
    }

    #[test]
    fn test_open_close_state_machine() {
        let term = ObjectSearchTerm::new("drop", "", None, false, false);
        let mut folder = open_folder(term, vec![]);

        assert_eq!(
            folder.open().unwrap_err().kind(),
            StorageErrorKind::AlreadyOpen
        );
        folder.close().unwrap();
        assert_eq!(
            folder.close().unwrap_err().kind(),
            StorageErrorKind::NotOpen
        );
    }

    #[test]
    fn test_description() {
        let term = ObjectSearchTerm::new("drop", "incoming", Some("a.txt".to_owned()), false, false);
        let folder = open_folder(term, vec![]);

        assert_eq!(
            folder.description(),
            "object 'incoming/a.txt' in bucket 'drop' on object store at 'scripted'"
        );
    }
}
