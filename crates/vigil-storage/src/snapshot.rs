//! Identity-keyed snapshot diffing shared by all backend folders.
//!
//! Every poll replaces the previous snapshot wholesale; only the identity
//! keys of the previous poll are retained to compute the "new since last
//! poll" subset. Identity keys are cheap per-backend digests (path+mtime,
//! row hash, object key+mtime) computed by the owning folder.

use std::collections::HashSet;

/// Diff state for one polling session.
///
/// `ingest` takes the raw `(identity, record)` pairs of one poll and
/// partitions them: all records of this poll, and the subset whose identity
/// was absent from the previous poll. The first ingest after construction
/// (or after [`reset`](Self::reset)) reports everything as new, since the
/// session has no baseline yet.
#[derive(Debug, Default)]
pub struct SnapshotState<M> {
    identities: HashSet<String>,
    new_records: Vec<M>,
    total: usize,
}

impl<M: Clone> SnapshotState<M> {
    /// Create an empty state with no baseline.
    #[must_use]
    pub fn new() -> Self {
        Self {
            identities: HashSet::new(),
            new_records: Vec::new(),
            total: 0,
        }
    }

    /// Ingest one poll's records and return the full snapshot.
    ///
    /// Records with the same identity within one poll collapse into one
    /// entry (last wins). The new-records cache is replaced as a side
    /// effect and can be read back with [`new_records`](Self::new_records).
    pub fn ingest(&mut self, records: Vec<(String, M)>) -> Vec<M> {
        let mut all: Vec<(String, M)> = Vec::with_capacity(records.len());
        let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
        let mut new_records = Vec::new();

        for (identity, record) in records {
            if !seen.insert(identity.clone()) {
                // duplicate identity within this poll: replace the earlier one
                if let Some(entry) = all.iter_mut().find(|(id, _)| *id == identity) {
                    entry.1 = record;
                }
                continue;
            }
            if !self.identities.contains(&identity) {
                new_records.push(record.clone());
            }
            all.push((identity, record));
        }

        self.identities = seen;
        self.new_records = new_records;
        self.total = all.len();

        all.into_iter().map(|(_, record)| record).collect()
    }

    /// Records of the last poll whose identity was absent from the poll
    /// before it.
    #[must_use]
    pub fn new_records(&self) -> Vec<M> {
        self.new_records.clone()
    }

    /// One-line summary of the last poll for logging.
    #[must_use]
    pub fn counts(&self) -> String {
        format!("total: {}, new: {}", self.total, self.new_records.len())
    }

    /// Drop the baseline, returning to the freshly-constructed state.
    ///
    /// Called on folder close so that close-then-open behaves like a new
    /// session.
    pub fn reset(&mut self) {
        self.identities.clear();
        self.new_records.clear();
        self.total = 0;
    }
}
