//! The atomic rule contract.

/// Evaluation priority of a rule within a composite.
///
/// Lower values are more urgent: a composite evaluates its children in
/// ascending priority order, so a cheap discriminating check (say, "is this
/// a file at all") placed at [`Priority::HIGHEST`] short-circuits expensive
/// checks like content hashing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Priority(pub i32);

impl Priority {
    /// The most urgent priority - evaluated first.
    pub const HIGHEST: Priority = Priority(i32::MIN);
    /// The least urgent priority - the default for every rule.
    pub const LOWEST: Priority = Priority(i32::MAX);
}

impl Default for Priority {
    fn default() -> Self {
        Priority::LOWEST
    }
}

impl From<i32> for Priority {
    fn from(value: i32) -> Self {
        Priority(value)
    }
}

/// Error raised while evaluating a rule against a record.
///
/// These are configuration errors (a rule asking for a property the record
/// does not carry, or carrying with the wrong type) or evaluation failures
/// (a content rule unable to read its file). They are raised immediately
/// and never retried.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// The record has no property under the requested key.
    #[error("property '{0}' is not present")]
    MissingProperty(String),

    /// The property exists but holds a different value type.
    #[error("property '{key}' is not a {expected}")]
    WrongType {
        /// The requested property key.
        key: String,
        /// The value type the rule needed.
        expected: &'static str,
    },

    /// The rule could not compute its predicate.
    #[error("rule '{rule}' failed to evaluate: {message}")]
    Evaluation {
        /// Name of the failing rule.
        rule: String,
        /// What went wrong.
        message: String,
    },
}

/// Name and description of a rule, captured for failure reports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleReport {
    /// The rule's name (its dedup/reporting key).
    pub name: String,
    /// The rule's human-readable description.
    pub description: String,
}

impl RuleReport {
    /// Capture the report of a rule.
    pub fn of<M>(rule: &(impl Rule<M> + ?Sized)) -> Self {
        Self {
            name: rule.name().to_owned(),
            description: rule.description(),
        }
    }
}

impl std::fmt::Display for RuleReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rule '{}' ({})", self.name, self.description)
    }
}

/// An atomic boolean predicate over one observation record.
///
/// Implementors provide [`perform_match`](Self::perform_match) - the raw
/// backend-specific predicate - plus a name and description. The provided
/// [`matches`](Self::matches) compares the raw outcome against
/// [`expected`](Self::expected), which lets every predicate double as a
/// positive check ("must equal") and a negative check ("must differ")
/// without separate predicate code.
pub trait Rule<M> {
    /// Rule name, used as the dedup and reporting key.
    fn name(&self) -> &str;

    /// Evaluation priority. Defaults to [`Priority::LOWEST`].
    fn priority(&self) -> Priority {
        Priority::LOWEST
    }

    /// The outcome [`perform_match`](Self::perform_match) must produce for
    /// this rule to match. Defaults to `true`.
    fn expected(&self) -> bool {
        true
    }

    /// The raw backend-specific predicate.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError`] when the record lacks the inspected property
    /// or the predicate cannot be computed.
    fn perform_match(&self, meta: &M) -> Result<bool, RuleError>;

    /// Whether this rule matches the record.
    ///
    /// # Errors
    ///
    /// Propagates [`perform_match`](Self::perform_match) errors.
    fn matches(&self, meta: &M) -> Result<bool, RuleError> {
        Ok(self.perform_match(meta)? == self.expected())
    }

    /// The property keys this rule inspects, for diagnostics and for
    /// snapshot evaluation to know which fields a rule expects to change.
    fn keys(&self) -> Vec<String> {
        Vec::new()
    }

    /// Human-readable description of the predicate, quoted in failure
    /// reports.
    fn description(&self) -> String;
}
