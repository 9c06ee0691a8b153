//! Database storage backend for the Vigil verification engine.
//!
//! Polls the result set of a read query and exposes each row as a
//! [`DbMeta`] record through the [`Matchable`](vigil_storage::Matchable)
//! contract. Row identity is a digest over every column and its value in
//! column order, so the snapshot diff notices any changed field without
//! retaining full row history.
//!
//! The actual database client sits behind the narrow [`DbProvider`] trait;
//! [`SqliteProvider`] implements it over an embedded `SQLite` connection.
//! A provider is owned exclusively by the folder it backs for the folder's
//! whole open/close lifetime - there is no pooling across folders here.

mod folder;
mod meta;
mod provider;
pub mod rules;
mod sqlite;

pub use folder::{DbFolder, DbStorage};
pub use meta::{DbMeta, db_identity};
pub use provider::{DbProvider, DbQuery, DbRow};
pub use sqlite::SqliteProvider;
