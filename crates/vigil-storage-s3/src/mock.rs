//! Mock object-store client for testing.

use std::cell::RefCell;
use std::collections::VecDeque;

use vigil_storage::StorageError;

use crate::client::{ObjectClient, ObjectRecord};

/// Scripted in-memory client for testing.
///
/// Each `list` call serves the next scripted listing; the last one repeats
/// once the script runs out. A scripted `None` stands for a bucket that
/// does not exist yet.
#[derive(Default)]
pub struct MockObjectClient {
    listings: RefCell<VecDeque<Option<Vec<ObjectRecord>>>>,
    last: RefCell<Option<Vec<ObjectRecord>>>,
}

impl MockObjectClient {
    /// Create a client with an empty script (every listing is empty).
    #[must_use]
    pub fn new() -> Self {
        Self {
            listings: RefCell::new(VecDeque::new()),
            last: RefCell::new(Some(Vec::new())),
        }
    }

    /// Append one scripted listing.
    #[must_use]
    pub fn with_listing(self, records: Vec<ObjectRecord>) -> Self {
        self.listings.borrow_mut().push_back(Some(records));
        self
    }

    /// Append one scripted poll where the bucket does not exist.
    #[must_use]
    pub fn with_missing_bucket(self) -> Self {
        self.listings.borrow_mut().push_back(None);
        self
    }
}

impl ObjectClient for MockObjectClient {
    fn list(&self, _bucket: &str, _prefix: &str) -> Result<Option<Vec<ObjectRecord>>, StorageError> {
        match self.listings.borrow_mut().pop_front() {
            Some(listing) => {
                self.last.borrow_mut().clone_from(&listing);
                Ok(listing)
            }
            None => Ok(self.last.borrow().clone()),
        }
    }

    fn description(&self) -> String {
        "object store 'mock'".to_owned()
    }
}
