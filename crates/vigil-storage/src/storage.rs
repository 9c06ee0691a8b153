//! Matchable/Storage traits and error types.
//!
//! Provides the core [`Matchable`] and [`Storage`] traits for abstracting
//! pollable backends, along with [`StorageError`] for unified error handling
//! across backends.

/// Semantic error categories for storage operations.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[non_exhaustive]
pub enum StorageErrorKind {
    /// A data operation was invoked on a folder that is not open.
    NotOpen,
    /// `open()` was invoked on a folder that is already open.
    AlreadyOpen,
    /// The search term is invalid for this backend (e.g. a bad pattern).
    InvalidTerm,
    /// The backend rejected the operation (malformed query, bad request).
    Rejected,
    /// Permission denied by the backend.
    PermissionDenied,
    /// The backend is unreachable or temporarily unavailable.
    Unavailable,
    /// Other/unknown error category.
    Other,
}

/// Storage error with semantic kind and backend-specific source.
///
/// State-misuse kinds ([`NotOpen`](StorageErrorKind::NotOpen),
/// [`AlreadyOpen`](StorageErrorKind::AlreadyOpen)) indicate programmer
/// error and are never retried. Everything else is a hard backend failure
/// propagated to the caller; retrying is the poll loop's business, not a
/// single poll's.
#[derive(Debug)]
pub struct StorageError {
    kind: StorageErrorKind,
    target: Option<String>,
    backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    /// Create a new storage error.
    #[must_use]
    pub fn new(kind: StorageErrorKind) -> Self {
        Self {
            kind,
            target: None,
            backend: None,
            source: None,
        }
    }

    /// Attach the human-readable description of the polled target.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Create a "not open" state-misuse error.
    #[must_use]
    pub fn not_open(target: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::NotOpen).with_target(target)
    }

    /// Create an "already open" state-misuse error.
    #[must_use]
    pub fn already_open(target: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::AlreadyOpen).with_target(target)
    }

    /// Create a storage error from an I/O error.
    #[must_use]
    pub fn io(err: std::io::Error, target: impl Into<String>) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::PermissionDenied => StorageErrorKind::PermissionDenied,
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::ConnectionRefused => {
                StorageErrorKind::Unavailable
            }
            _ => StorageErrorKind::Other,
        };
        Self::new(kind).with_target(target).with_source(err)
    }

    /// Semantic error category.
    #[must_use]
    pub fn kind(&self) -> StorageErrorKind {
        self.kind
    }

    /// Target description, if attached.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Backend identifier, if attached.
    #[must_use]
    pub fn backend(&self) -> Option<&'static str> {
        self.backend
    }

    /// Downcast the source error to a concrete type.
    #[must_use]
    pub fn downcast_source<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_ref()?.downcast_ref()
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: message (target)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            StorageErrorKind::NotOpen => "Not open",
            StorageErrorKind::AlreadyOpen => "Already open",
            StorageErrorKind::InvalidTerm => "Invalid search term",
            StorageErrorKind::Rejected => "Rejected by backend",
            StorageErrorKind::PermissionDenied => "Permission denied",
            StorageErrorKind::Unavailable => "Unavailable",
            StorageErrorKind::Other => "Error",
        };

        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(target) = &self.target {
            write!(f, " ({target})")?;
        }

        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// One polling session against one backend target.
///
/// A folder is constructed unopened by [`Storage::folder`], opened before
/// the first poll, and closed when verification against it ends. It is not
/// reusable with a different search term and not safe for concurrent use
/// from multiple threads - each verification run owns its folder.
///
/// # State machine
///
/// `CLOSED --open()--> OPEN --close()--> CLOSED`. Opening an open folder
/// fails with [`StorageErrorKind::AlreadyOpen`]; every data operation on a
/// closed folder fails with [`StorageErrorKind::NotOpen`]. Closing resets
/// the identity baseline, so close-then-open is indistinguishable from a
/// freshly constructed folder.
pub trait Matchable {
    /// The backend-specific observation record type.
    type Meta;

    /// Open the polling session.
    ///
    /// # Errors
    ///
    /// Returns [`StorageErrorKind::AlreadyOpen`] if the folder is open, or
    /// a backend error if the session cannot be established.
    fn open(&mut self) -> Result<(), StorageError>;

    /// Close the polling session and drop the identity baseline.
    ///
    /// # Errors
    ///
    /// Returns [`StorageErrorKind::NotOpen`] if the folder is not open.
    fn close(&mut self) -> Result<(), StorageError>;

    /// Re-run the backend query and return the full current snapshot.
    ///
    /// Also computes the new/changed subset as a side effect, cached for
    /// the next [`new_meta_data`](Self::new_meta_data) call. A missing
    /// target (directory or bucket not created yet) is an empty snapshot,
    /// not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageErrorKind::NotOpen`] on a closed folder, or a hard
    /// backend failure.
    fn all_meta_data(&mut self) -> Result<Vec<Self::Meta>, StorageError>;

    /// Poll and return only records whose identity was absent from the
    /// previous poll.
    ///
    /// The first call after `open()` returns the entire snapshot: a fresh
    /// session has no history, so everything observed is novel to it.
    ///
    /// # Errors
    ///
    /// Same as [`all_meta_data`](Self::all_meta_data).
    fn new_meta_data(&mut self) -> Result<Vec<Self::Meta>, StorageError>;

    /// One-line "total: N, new: M" summary of the last poll, for logging.
    ///
    /// # Errors
    ///
    /// Returns [`StorageErrorKind::NotOpen`] on a closed folder.
    fn meta_data_counts(&self) -> Result<String, StorageError>;

    /// Human-readable description of the polled target for log and error
    /// messages (e.g. `file '/out/report.txt'`).
    fn description(&self) -> String;
}

/// Factory turning a backend-specific search term into an unopened folder.
///
/// Consumes the storage so that backend sessions (database connections,
/// object-store clients) are owned exclusively by the folder they back for
/// its whole open/close lifetime.
pub trait Storage {
    /// The backend-specific query descriptor.
    type Term;
    /// The folder type this storage produces.
    type Folder: Matchable;

    /// Construct a new, unopened folder for `term`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the term cannot back a folder on this
    /// backend.
    fn folder(self, term: Self::Term) -> Result<Self::Folder, StorageError>;
}
