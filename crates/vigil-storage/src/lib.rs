//! Storage polling abstraction for the Vigil verification engine.
//!
//! This crate provides the contract that makes heterogeneous data sources
//! (filesystem, relational database, object storage) pollable through one
//! interface. This enables:
//!
//! - **Unit testing** against a scripted in-memory folder
//! - **Backend flexibility** (filesystem, `SQLite`, S3-compatible stores)
//! - **Clean separation** between the verification loop and backend I/O
//!
//! # Architecture
//!
//! The crate provides:
//! - [`MetaData`] - an insertion-ordered bag of typed attribute [`Value`]s,
//!   the unit exchanged between storage folders and rules
//! - [`Matchable`] trait - one polling session against one backend, with
//!   `all_meta_data()` / `new_meta_data()` snapshots
//! - [`Storage`] trait - a factory turning a backend search term into an
//!   unopened [`Matchable`]
//! - [`SnapshotState`] - the identity-keyed diff shared by every backend
//! - [`MockFolder`] for testing (behind the `mock` feature flag)
//!
//! # Example
//!
//! ```ignore
//! use vigil_storage::Matchable;
//!
//! let mut folder = storage.folder(term)?;
//! folder.open()?;
//! let all = folder.all_meta_data()?;
//! let new = folder.new_meta_data()?;
//! folder.close()?;
//! ```

mod metadata;
#[cfg(feature = "mock")]
mod mock;
mod snapshot;
mod storage;

pub use metadata::{MetaData, Value};
#[cfg(feature = "mock")]
pub use mock::{MockFolder, PollScript};
pub use snapshot::SnapshotState;
pub use storage::{Matchable, Storage, StorageError, StorageErrorKind};
