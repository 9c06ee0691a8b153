//! Mock folder implementation for testing.
//!
//! Provides [`MockFolder`] for unit testing poll loops without a real
//! backend. Polls are scripted up front; each data call consumes the next
//! scripted poll, and the last one repeats once the script runs out.

use std::collections::VecDeque;

use crate::metadata::{MetaData, Value};
use crate::snapshot::SnapshotState;
use crate::storage::{Matchable, StorageError, StorageErrorKind};

/// One scripted poll outcome.
#[derive(Debug, Clone)]
pub enum PollScript {
    /// The backend returns these `(identity, record)` pairs.
    Records(Vec<(String, MetaData)>),
    /// The backend fails hard with this error kind.
    Fail(StorageErrorKind),
}

/// Scripted in-memory folder for testing.
///
/// # Example
///
/// ```ignore
/// use vigil_storage::{Matchable, MockFolder};
///
/// let mut folder = MockFolder::new("mock target")
///     .with_poll(vec![MockFolder::record("id-1", vec![("name", "a".into())])])
///     .with_poll(vec![]);
///
/// folder.open()?;
/// assert_eq!(folder.all_meta_data()?.len(), 1);
/// assert_eq!(folder.all_meta_data()?.len(), 0);
/// ```
#[derive(Debug, Default)]
pub struct MockFolder {
    description: String,
    is_open: bool,
    script: VecDeque<PollScript>,
    last: Vec<(String, MetaData)>,
    state: SnapshotState<MetaData>,
    polls_served: usize,
}

impl MockFolder {
    /// Create a mock folder with the given target description.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    /// Append one scripted poll returning the given records.
    #[must_use]
    pub fn with_poll(mut self, records: Vec<(String, MetaData)>) -> Self {
        self.script.push_back(PollScript::Records(records));
        self
    }

    /// Append one scripted poll that fails hard.
    #[must_use]
    pub fn with_failure(mut self, kind: StorageErrorKind) -> Self {
        self.script.push_back(PollScript::Fail(kind));
        self
    }

    /// Build an `(identity, record)` pair from property tuples.
    #[must_use]
    pub fn record(identity: impl Into<String>, props: Vec<(&str, Value)>) -> (String, MetaData) {
        let mut meta = MetaData::new();
        for (key, value) in props {
            meta.put_property(key, value);
        }
        (identity.into(), meta)
    }

    /// Number of polls served so far (across open/close cycles).
    #[must_use]
    pub fn polls_served(&self) -> usize {
        self.polls_served
    }

    fn next_poll(&mut self) -> Result<Vec<(String, MetaData)>, StorageError> {
        match self.script.pop_front() {
            Some(PollScript::Records(records)) => {
                self.last = records.clone();
                Ok(records)
            }
            Some(PollScript::Fail(kind)) => Err(StorageError::new(kind)
                .with_backend("Mock")
                .with_target(self.description.clone())),
            // script exhausted: the backend keeps reporting its last state
            None => Ok(self.last.clone()),
        }
    }
}

impl Matchable for MockFolder {
    type Meta = MetaData;

    fn open(&mut self) -> Result<(), StorageError> {
        if self.is_open {
            return Err(StorageError::already_open(self.description.clone()).with_backend("Mock"));
        }
        self.is_open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), StorageError> {
        if !self.is_open {
            return Err(StorageError::not_open(self.description.clone()).with_backend("Mock"));
        }
        self.state.reset();
        self.is_open = false;
        Ok(())
    }

    fn all_meta_data(&mut self) -> Result<Vec<MetaData>, StorageError> {
        if !self.is_open {
            return Err(StorageError::not_open(self.description.clone()).with_backend("Mock"));
        }
        self.polls_served += 1;
        let records = self.next_poll()?;
        Ok(self.state.ingest(records))
    }

    fn new_meta_data(&mut self) -> Result<Vec<MetaData>, StorageError> {
        self.all_meta_data()?;
        Ok(self.state.new_records())
    }

    fn meta_data_counts(&self) -> Result<String, StorageError> {
        if !self.is_open {
            return Err(StorageError::not_open(self.description.clone()).with_backend("Mock"));
        }
        Ok(self.state.counts())
    }

    fn description(&self) -> String {
        self.description.clone()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn one_record(id: &str) -> Vec<(String, MetaData)> {
        vec![MockFolder::record(id, vec![("name", Value::from(id))])]
    }

    #[test]
    fn test_data_ops_require_open() {
        let mut folder = MockFolder::new("mock target");

        let err = folder.all_meta_data().unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::NotOpen);
        let err = folder.meta_data_counts().unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::NotOpen);
    }

    #[test]
    fn test_double_open_fails() {
        let mut folder = MockFolder::new("mock target");
        folder.open().unwrap();

        let err = folder.open().unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::AlreadyOpen);

        // still fails no matter how often it is retried
        let err = folder.open().unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::AlreadyOpen);
    }

    #[test]
    fn test_close_without_open_fails() {
        let mut folder = MockFolder::new("mock target");
        let err = folder.close().unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::NotOpen);
    }

    #[test]
    fn test_first_poll_is_all_new() {
        let mut folder = MockFolder::new("mock target").with_poll(one_record("a"));
        folder.open().unwrap();

        let new = folder.new_meta_data().unwrap();

        assert_eq!(new.len(), 1);
    }

    #[test]
    fn test_script_exhaustion_repeats_last_poll() {
        let mut folder = MockFolder::new("mock target").with_poll(one_record("a"));
        folder.open().unwrap();

        assert_eq!(folder.all_meta_data().unwrap().len(), 1);
        assert_eq!(folder.all_meta_data().unwrap().len(), 1);
        assert!(folder.new_meta_data().unwrap().is_empty());
    }

    #[test]
    fn test_scripted_failure() {
        let mut folder = MockFolder::new("mock target")
            .with_failure(StorageErrorKind::Unavailable);
        folder.open().unwrap();

        let err = folder.all_meta_data().unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::Unavailable);
        assert_eq!(err.backend(), Some("Mock"));
    }

    #[test]
    fn test_close_then_open_resets_baseline() {
        let mut folder = MockFolder::new("mock target")
            .with_poll(one_record("a"))
            .with_poll(one_record("a"));
        folder.open().unwrap();
        assert_eq!(folder.new_meta_data().unwrap().len(), 1);

        folder.close().unwrap();
        folder.open().unwrap();

        // no stale identity map: the same record is new again
        assert_eq!(folder.new_meta_data().unwrap().len(), 1);
    }

    #[test]
    fn test_counts_reflect_last_poll() {
        let mut folder = MockFolder::new("mock target").with_poll(one_record("a"));
        folder.open().unwrap();
        folder.all_meta_data().unwrap();

        assert_eq!(folder.meta_data_counts().unwrap(), "total: 1, new: 1");
    }
}
