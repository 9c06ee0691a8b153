//! Predicate family for database rows.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use vigil_rules::{Rule, RuleError};
use vigil_storage::Value;

use crate::meta::DbMeta;

/// Compares one column against an expected value.
///
/// A value-type mismatch between the column and the expectation is a
/// configuration error, not a non-match: the rule raises
/// [`RuleError::WrongType`] instead of quietly failing, so a rule wired
/// against the wrong column is caught on the first poll.
pub struct DbFieldRule {
    name: String,
    expected: bool,
    column: String,
    value: Value,
}

impl DbFieldRule {
    /// Expect `column` to hold exactly `value`.
    #[must_use]
    pub fn new(
        column: impl Into<String>,
        value: impl Into<Value>,
        name: impl Into<String>,
        expected: bool,
    ) -> Self {
        Self {
            name: name.into(),
            expected,
            column: column.into(),
            value: value.into(),
        }
    }
}

impl Rule<DbMeta> for DbFieldRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn expected(&self) -> bool {
        self.expected
    }

    fn perform_match(&self, meta: &DbMeta) -> Result<bool, RuleError> {
        let actual = meta.field(&self.column)?;

        // a NULL on either side is an honest comparison, not a type error
        if matches!(actual, Value::Null) || matches!(self.value, Value::Null) {
            return Ok(*actual == self.value);
        }

        if std::mem::discriminant(actual) != std::mem::discriminant(&self.value) {
            return Err(RuleError::WrongType {
                key: self.column.clone(),
                expected: self.value.type_name(),
            });
        }

        Ok(*actual == self.value)
    }

    fn keys(&self) -> Vec<String> {
        vec![self.column.clone()]
    }

    fn description(&self) -> String {
        format!("column '{}' equals '{}'", self.column, self.value)
    }
}

/// How a date column relates to the expected timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateRelation {
    /// The column value is at or before the expected timestamp.
    Before,
    /// The column value is at or after the expected timestamp.
    After,
    /// The column value equals the expected timestamp.
    Exact,
}

/// Compares a date column against an expected timestamp.
///
/// Accepts either a typed time column or a text column, in which case the
/// text is parsed with the configured pattern (`%Y-%m-%d %H:%M:%S` by
/// default, interpreted as UTC).
pub struct DbDateFieldRule {
    name: String,
    expected: bool,
    column: String,
    value: DateTime<Utc>,
    relation: DateRelation,
    pattern: String,
}

impl DbDateFieldRule {
    /// Expect `column` to relate to `value` per `relation`.
    #[must_use]
    pub fn new(
        column: impl Into<String>,
        value: DateTime<Utc>,
        relation: DateRelation,
        name: impl Into<String>,
        expected: bool,
    ) -> Self {
        Self {
            name: name.into(),
            expected,
            column: column.into(),
            value,
            relation,
            pattern: "%Y-%m-%d %H:%M:%S".to_owned(),
        }
    }

    /// Override the pattern used to parse text columns.
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    fn actual_time(&self, meta: &DbMeta) -> Result<DateTime<Utc>, RuleError> {
        match meta.field(&self.column)? {
            Value::Time(t) => Ok(*t),
            Value::Str(text) => NaiveDateTime::parse_from_str(text, &self.pattern)
                .map(|naive| naive.and_utc())
                .map_err(|e| RuleError::Evaluation {
                    rule: self.name.clone(),
                    message: format!("'{text}' does not parse as '{}': {e}", self.pattern),
                }),
            other => {
                tracing::debug!(
                    column = %self.column,
                    found = other.type_name(),
                    "date rule applied to a non-date column"
                );
                Err(RuleError::WrongType {
                    key: self.column.clone(),
                    expected: "time",
                })
            }
        }
    }
}

impl Rule<DbMeta> for DbDateFieldRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn expected(&self) -> bool {
        self.expected
    }

    fn perform_match(&self, meta: &DbMeta) -> Result<bool, RuleError> {
        let actual = self.actual_time(meta)?;
        Ok(match self.relation {
            DateRelation::Before => actual <= self.value,
            DateRelation::After => actual >= self.value,
            DateRelation::Exact => actual == self.value,
        })
    }

    fn keys(&self) -> Vec<String> {
        vec![self.column.clone()]
    }

    fn description(&self) -> String {
        let relation = match self.relation {
            DateRelation::Before => "is at or before",
            DateRelation::After => "is at or after",
            DateRelation::Exact => "equals",
        };
        format!(
            "column '{}' {} {}",
            self.column,
            relation,
            self.value.to_rfc3339_opts(SecondsFormat::Secs, true)
        )
    }
}
