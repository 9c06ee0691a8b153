//! The generic verification driver skeleton.

use vigil_rules::{Rule, RuleOp};
use vigil_storage::Matchable;

use crate::error::VerifyError;
use crate::evaluator::MetaEvaluator;
use crate::monitor::{Monitor, PollingParams};

/// Owns one folder, one root AND composite and the polling parameters,
/// and exposes the four temporal verification calls over them.
///
/// The backend-specific drivers ([`FileVerification`](crate::FileVerification),
/// [`DbVerification`](crate::DbVerification),
/// [`ObjectVerification`](crate::ObjectVerification)) wrap this with their
/// fluent `check_*` surface.
pub struct Verification<F: Matchable> {
    name: String,
    folder: F,
    root: RuleOp<F::Meta>,
    params: PollingParams,
}

impl<F: Matchable> Verification<F>
where
    F::Meta: Clone,
{
    /// Create a driver around a folder, with default polling parameters.
    #[must_use]
    pub fn new(name: impl Into<String>, folder: F) -> Self {
        Self {
            name: name.into(),
            folder,
            root: RuleOp::and(),
            params: PollingParams::default(),
        }
    }

    /// Override the polling parameters for this driver instance.
    pub fn set_polling_params(&mut self, params: PollingParams) {
        self.params = params;
    }

    /// The polling parameters in effect.
    #[must_use]
    pub fn params(&self) -> &PollingParams {
        &self.params
    }

    /// Append a rule to the root composite.
    pub fn add_rule(&mut self, rule: impl Rule<F::Meta> + 'static) {
        self.root.add_rule(rule);
    }

    /// Reset the root composite, for reusing the driver across
    /// assertions.
    pub fn clear_rules(&mut self) {
        self.root.clear();
    }

    /// Poll until the rules match at least one record, or the window
    /// ends. Returns the matched records.
    pub fn verify_exists(&mut self) -> Result<Vec<F::Meta>, VerifyError> {
        let evaluator = MetaEvaluator::new(&self.root);
        Monitor::new(&self.name, &mut self.folder, &evaluator, &self.params).verify_exists()
    }

    /// Poll until the window ends; once the rules have matched, they must
    /// keep matching on every later poll. Returns the last matched
    /// records.
    pub fn verify_always_exists(&mut self) -> Result<Vec<F::Meta>, VerifyError> {
        let evaluator = MetaEvaluator::new(&self.root);
        Monitor::new(&self.name, &mut self.folder, &evaluator, &self.params).verify_always_exists()
    }

    /// Poll until the window ends; any matching poll fails immediately.
    pub fn verify_never_exists(&mut self) -> Result<(), VerifyError> {
        let evaluator = MetaEvaluator::new(&self.root);
        Monitor::new(&self.name, &mut self.folder, &evaluator, &self.params).verify_never_exists()
    }

    /// Check the current snapshot once, immediately; a match fails.
    pub fn verify_does_not_exist(&mut self) -> Result<(), VerifyError> {
        let evaluator = MetaEvaluator::new(&self.root);
        Monitor::new(&self.name, &mut self.folder, &evaluator, &self.params).verify_does_not_exist()
    }
}
