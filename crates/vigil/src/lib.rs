//! Polling-based state-verification engine.
//!
//! Vigil repeatedly snapshots a data source (filesystem directory,
//! database query result, object-store prefix), diffs the snapshots by
//! backend-defined identity keys, and evaluates a composable set of
//! boolean rules against the observed records until a temporal condition
//! holds or a deadline passes.
//!
//! # Temporal conditions
//!
//! - [`verify_exists`](Verification::verify_exists) - the expected state
//!   appears within the window
//! - [`verify_always_exists`](Verification::verify_always_exists) - once
//!   observed, the state holds until the window ends
//! - [`verify_never_exists`](Verification::verify_never_exists) - the
//!   state never appears within the window
//! - [`verify_does_not_exist`](Verification::verify_does_not_exist) - the
//!   state is absent right now (single check, no polling)
//!
//! # Example
//!
//! ```ignore
//! use vigil::FileVerification;
//!
//! let mut verification = FileVerification::new("/out/report.txt")?;
//! verification.check_size(1024).check_content("rows:", false, true)?;
//! let matched = verification.verify_file_exists()?;
//! ```
//!
//! Drivers run their poll loop synchronously on the calling thread and
//! share no state; run independent drivers from separate threads for
//! concurrent verifications.

mod db;
mod driver;
mod error;
mod evaluator;
mod fs;
mod monitor;
mod s3;

pub use db::DbVerification;
pub use driver::Verification;
pub use error::{Failure, VerifyError};
pub use evaluator::{Evaluation, Evaluator, MetaEvaluator, SnapshotEvaluator};
pub use fs::FileVerification;
pub use monitor::{Monitor, PollingParams};
pub use s3::ObjectVerification;

// The pieces needed to construct and extend drivers, re-exported so that
// a straightforward verification needs only this crate.
pub use vigil_config::{Config, PollingConfig};
pub use vigil_rules::{Priority, Rule, RuleError, RuleOp};
pub use vigil_storage::{Matchable, MetaData, Storage, StorageError, Value};
pub use vigil_storage_db::rules::DateRelation;
pub use vigil_storage_db::{DbProvider, DbQuery, SqliteProvider};
pub use vigil_storage_fs::FileSearchTerm;
pub use vigil_storage_s3::{AwsObjectClient, ObjectClient, ObjectSearchTerm};
