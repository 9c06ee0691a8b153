//! Database folder and storage factory.

use vigil_storage::{Matchable, SnapshotState, Storage, StorageError};

use crate::meta::{DbMeta, db_identity};
use crate::provider::{DbProvider, DbQuery};

/// Backend identifier for error messages.
const BACKEND: &str = "Db";

/// One polling session against the result set of one query.
///
/// Owns its [`DbProvider`] exclusively for the open/close lifetime; the
/// query re-runs on every poll and rows diff by the column digest.
pub struct DbFolder<P> {
    provider: P,
    query: DbQuery,
    is_open: bool,
    state: SnapshotState<DbMeta>,
    identity: fn(&DbMeta) -> String,
}

impl<P: DbProvider> DbFolder<P> {
    pub(crate) fn new(provider: P, query: DbQuery) -> Self {
        Self {
            provider,
            query,
            is_open: false,
            state: SnapshotState::new(),
            identity: db_identity,
        }
    }

    /// Replace the identity function used for snapshot diffing.
    #[must_use]
    pub fn with_identity(mut self, identity: fn(&DbMeta) -> String) -> Self {
        self.identity = identity;
        self
    }
}

impl<P: DbProvider> Matchable for DbFolder<P> {
    type Meta = DbMeta;

    fn open(&mut self) -> Result<(), StorageError> {
        if self.is_open {
            return Err(StorageError::already_open(self.description()).with_backend(BACKEND));
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

    fn all_meta_data(&mut self) -> Result<Vec<DbMeta>, StorageError> {
        if !self.is_open {
            return Err(StorageError::not_open(self.description()).with_backend(BACKEND));
        }

        let rows = self.provider.select(&self.query)?;
        let keyed = rows
            .into_iter()
            .map(|row| {
                let meta = DbMeta::from_row(row);
                ((self.identity)(&meta), meta)
            })
            .collect();
        Ok(self.state.ingest(keyed))
    }

    fn new_meta_data(&mut self) -> Result<Vec<DbMeta>, StorageError> {
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
        format!("query '{}' on {}", self.query.sql(), self.provider.description())
    }
}

/// Factory for database folders.
pub struct DbStorage<P> {
    provider: P,
}

impl<P: DbProvider> DbStorage<P> {
    /// Create a storage factory around one database client.
    #[must_use]
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: DbProvider> Storage for DbStorage<P> {
    type Term = DbQuery;
    type Folder = DbFolder<P>;

    fn folder(self, term: DbQuery) -> Result<DbFolder<P>, StorageError> {
        Ok(DbFolder::new(self.provider, term))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use pretty_assertions::assert_eq;
    use vigil_storage::{StorageErrorKind, Value};

    use crate::provider::DbRow;

    use super::*;

    /// Scripted provider: each select serves the next scripted result set,
    /// repeating the last one once the script runs out.
    struct ScriptedProvider {
        polls: RefCell<VecDeque<Vec<DbRow>>>,
        last: RefCell<Vec<DbRow>>,
    }

    impl ScriptedProvider {
        fn new(polls: Vec<Vec<DbRow>>) -> Self {
            Self {
                polls: RefCell::new(polls.into()),
                last: RefCell::new(Vec::new()),
            }
        }
    }

    impl DbProvider for ScriptedProvider {
        fn select(&self, _query: &DbQuery) -> Result<Vec<DbRow>, StorageError> {
            match self.polls.borrow_mut().pop_front() {
                Some(rows) => {
                    *self.last.borrow_mut() = rows.clone();
                    Ok(rows)
                }
                None => Ok(self.last.borrow().clone()),
            }
        }

        fn description(&self) -> String {
            "database 'scripted'".to_owned()
        }
    }

    fn row(id: i64, state: &str) -> DbRow {
        vec![
            ("id".to_owned(), Value::Int(id)),
            ("state".to_owned(), Value::Str(state.to_owned())),
        ]
    }

    fn open_folder(polls: Vec<Vec<DbRow>>) -> DbFolder<ScriptedProvider> {
        let storage = DbStorage::new(ScriptedProvider::new(polls));
        let mut folder = storage.folder(DbQuery::new("SELECT * FROM runs")).unwrap();
        folder.open().unwrap();
        folder
    }

    #[test]
    fn test_open_twice_fails() {
        let mut folder = open_folder(vec![]);
        let err = folder.open().unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::AlreadyOpen);
    }

    #[test]
    fn test_data_ops_require_open() {
        let storage = DbStorage::new(ScriptedProvider::new(vec![]));
        let mut folder = storage.folder(DbQuery::new("SELECT 1")).unwrap();

        let err = folder.all_meta_data().unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::NotOpen);
    }

    #[test]
    fn test_first_poll_is_all_new() {
        let mut folder = open_folder(vec![vec![row(1, "done"), row(2, "done")]]);

        let new = folder.new_meta_data().unwrap();
        assert_eq!(new.len(), 2);
    }

    #[test]
    fn test_unchanged_rows_are_not_new() {
        let mut folder = open_folder(vec![
            vec![row(1, "done")],
            vec![row(1, "done")],
        ]);

        folder.all_meta_data().unwrap();
        assert!(folder.new_meta_data().unwrap().is_empty());
    }

    #[test]
    fn test_changed_field_makes_row_new_again() {
        let mut folder = open_folder(vec![
            vec![row(1, "running")],
            vec![row(1, "done")],
        ]);

        folder.all_meta_data().unwrap();
        let new = folder.new_meta_data().unwrap();

        assert_eq!(new.len(), 1);
        assert_eq!(new[0].field("state").unwrap(), &Value::Str("done".to_owned()));
    }

    #[test]
    fn test_close_resets_baseline() {
        let mut folder = open_folder(vec![vec![row(1, "done")], vec![row(1, "done")]]);
        assert_eq!(folder.new_meta_data().unwrap().len(), 1);

        folder.close().unwrap();
        folder.open().unwrap();

        assert_eq!(folder.new_meta_data().unwrap().len(), 1);
    }

    #[test]
    fn test_description_names_query_and_endpoint() {
        let folder = open_folder(vec![]);
        assert_eq!(
            folder.description(),
            "query 'SELECT * FROM runs' on database 'scripted'"
        );
    }
}
