//! Database verification driver.

use chrono::{DateTime, Utc};
use vigil_storage::{Storage, Value};
use vigil_storage_db::rules::{DateRelation, DbDateFieldRule, DbFieldRule};
use vigil_storage_db::{DbFolder, DbMeta, DbProvider, DbQuery, DbStorage};

use crate::driver::Verification;
use crate::error::VerifyError;
use crate::monitor::PollingParams;

/// Verification client for database state.
///
/// Polls the result set of one read query and evaluates field checks
/// against every row.
///
/// # Example
///
/// ```ignore
/// let provider = SqliteProvider::connect("sqlite://state.db")?;
/// let mut verification =
///     DbVerification::new(provider, DbQuery::new("SELECT * FROM runs"))?;
/// verification.check_field_value_equals("state", "done");
/// let rows = verification.verify_exists()?;
/// ```
pub struct DbVerification<P: DbProvider> {
    inner: Verification<DbFolder<P>>,
}

impl<P: DbProvider> DbVerification<P> {
    /// Verify rows returned by `query` on the database behind `provider`.
    pub fn new(provider: P, query: DbQuery) -> Result<Self, VerifyError> {
        let folder = DbStorage::new(provider).folder(query)?;
        Ok(Self {
            inner: Verification::new("db_monitor", folder),
        })
    }

    /// Override the polling parameters for this driver instance.
    pub fn set_polling_params(&mut self, params: PollingParams) -> &mut Self {
        self.inner.set_polling_params(params);
        self
    }

    /// Remove every added check, for reusing the driver.
    pub fn clear_rules(&mut self) -> &mut Self {
        self.inner.clear_rules();
        self
    }

    /// Check that `column` holds exactly `value`.
    pub fn check_field_value_equals(
        &mut self,
        column: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.inner.add_rule(DbFieldRule::new(
            column,
            value,
            "check_field_value_equals",
            true,
        ));
        self
    }

    /// Check that `column` holds anything but `value`.
    pub fn check_field_value_does_not_equal(
        &mut self,
        column: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.inner.add_rule(DbFieldRule::new(
            column,
            value,
            "check_field_value_does_not_equal",
            false,
        ));
        self
    }

    /// Check that the date in `column` relates to `value` per `relation`.
    pub fn check_field_date(
        &mut self,
        column: impl Into<String>,
        value: DateTime<Utc>,
        relation: DateRelation,
    ) -> &mut Self {
        self.inner.add_rule(DbDateFieldRule::new(
            column,
            value,
            relation,
            "check_field_date",
            true,
        ));
        self
    }

    /// Poll until some row satisfies every check, or the window ends.
    pub fn verify_exists(&mut self) -> Result<Vec<DbMeta>, VerifyError> {
        self.inner.verify_exists()
    }

    /// Verify no row satisfies the checks right now.
    pub fn verify_does_not_exist(&mut self) -> Result<(), VerifyError> {
        self.inner.verify_does_not_exist()
    }

    /// Verify a satisfying row exists for the whole polling window.
    pub fn verify_always_exists(&mut self) -> Result<Vec<DbMeta>, VerifyError> {
        self.inner.verify_always_exists()
    }

    /// Verify no satisfying row appears during the whole polling window.
    pub fn verify_never_exists(&mut self) -> Result<(), VerifyError> {
        self.inner.verify_never_exists()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use vigil_storage::Value;
    use vigil_storage_db::SqliteProvider;

    use crate::error::VerifyError;

    use super::*;

    fn seeded_provider() -> SqliteProvider {
        let provider = SqliteProvider::connect("sqlite::memory:").unwrap();
        provider
            .execute(
                "CREATE TABLE runs (
                    id INTEGER PRIMARY KEY,
                    field TEXT NOT NULL,
                    finished_at DATETIME
                );
                INSERT INTO runs VALUES
                    (1, 'value00', '2026-01-05 10:00:00'),
                    (2, 'value01', '2026-01-06 09:30:00');",
            )
            .unwrap();
        provider
    }

    fn fast_params() -> PollingParams {
        PollingParams {
            initial_delay: Duration::ZERO,
            interval: Duration::from_millis(1),
            attempts: 3,
            timeout: Duration::from_secs(10),
        }
    }

    fn verification() -> DbVerification<SqliteProvider> {
        let mut verification = DbVerification::new(
            seeded_provider(),
            DbQuery::new("SELECT * FROM runs ORDER BY id"),
        )
        .unwrap();
        verification.set_polling_params(fast_params());
        verification
    }

    #[test]
    fn test_field_value_equals_matches_the_right_row() {
        let mut verification = verification();
        verification.check_field_value_equals("field", "value00");

        let rows = verification.verify_exists().unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].field("id").unwrap(), &Value::Int(1));
    }

    #[test]
    fn test_field_value_does_not_equal_never_matches_the_same_row() {
        let mut verification = verification();
        verification
            .check_field_value_equals("field", "value00")
            .check_field_value_does_not_equal("field", "value00");

        assert!(verification.verify_exists().is_err());
    }

    #[test]
    fn test_verify_does_not_exist() {
        let mut verification = verification();
        verification.check_field_value_equals("field", "value99");

        verification.verify_does_not_exist().unwrap();
    }

    #[test]
    fn test_verify_never_exists_fails_when_row_is_there() {
        let mut verification = verification();
        verification.check_field_value_equals("field", "value01");

        let err = verification.verify_never_exists().unwrap_err();
        assert!(matches!(err, VerifyError::Failed(_)));
    }

    #[test]
    fn test_date_check() {
        let cutoff = "2026-01-06T00:00:00Z".parse().unwrap();

        let mut verification = verification();
        verification
            .check_field_value_equals("field", "value00")
            .check_field_date("finished_at", cutoff, DateRelation::Before);

        assert_eq!(verification.verify_exists().unwrap().len(), 1);
    }

    #[test]
    fn test_always_exists_over_stable_result_set() {
        let mut verification = verification();
        verification.check_field_value_equals("field", "value00");

        assert_eq!(verification.verify_always_exists().unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_query_is_a_storage_error() {
        let mut verification = DbVerification::new(
            seeded_provider(),
            DbQuery::new("SELECT FROM WHERE"),
        )
        .unwrap();
        verification.set_polling_params(fast_params());
        verification.check_field_value_equals("field", "value00");

        let err = verification.verify_exists().unwrap_err();
        assert!(matches!(err, VerifyError::Storage(_)));
    }

    #[test]
    fn test_clear_rules_reuse() {
        let mut verification = verification();

        verification.check_field_value_equals("field", "value99");
        verification.verify_does_not_exist().unwrap();

        verification.clear_rules().check_field_value_equals("field", "value00");
        assert_eq!(verification.verify_exists().unwrap().len(), 1);
    }
}
