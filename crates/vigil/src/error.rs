//! Error taxonomy of the verification layer.
//!
//! A [`VerifyError::Failed`] means the assertion was false within the
//! polling window; the storage and rule variants mean the system under
//! test (or the rule configuration) was broken. Callers can tell the two
//! apart without string matching.

use vigil_rules::{RuleError, RuleReport};
use vigil_storage::StorageError;

/// Error returned by the temporal verification methods.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// The verified condition did not hold.
    #[error("verification failed - {0}")]
    Failed(Failure),

    /// The backend failed hard during a poll.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A rule could not be evaluated (configuration error).
    #[error(transparent)]
    Rule(#[from] RuleError),
}

/// Details of a failed verification.
#[derive(Debug)]
pub struct Failure {
    /// Name of the monitor that ran the verification.
    pub monitor: String,
    /// What was expected and what was observed instead.
    pub reason: String,
    /// The first failing rule of the last evaluated poll, when known.
    pub failed_rule: Option<RuleReport>,
    /// Number of polls performed before giving up.
    pub attempts: u32,
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} (after {} poll{})",
            self.monitor,
            self.reason,
            self.attempts,
            if self.attempts == 1 { "" } else { "s" }
        )?;
        if let Some(rule) = &self.failed_rule {
            write!(f, "; last failing {rule}")?;
        }
        Ok(())
    }
}
