//! Filesystem storage backend for the Vigil verification engine.
//!
//! Polls a directory for entries matching a [`FileSearchTerm`] and exposes
//! them as [`FileMeta`] records through the [`Matchable`](vigil_storage::Matchable)
//! contract. A directory that does not exist yet is an empty poll, not an
//! error - the target may simply not have been created at poll time.
//!
//! The [`rules`] module ships the predicate family for file records: entry
//! kind, size, modification time, ownership, permissions, content and
//! checksum checks.

mod folder;
mod meta;
pub mod rules;
mod term;

pub use folder::{FileFolder, FileStorage};
pub use meta::{FileMeta, file_identity, keys};
pub use term::FileSearchTerm;
