//! Object-store verification driver.

use chrono::{DateTime, Utc};
use vigil_rules::Priority;
use vigil_storage::Storage;
use vigil_storage_s3::rules::{
    ObjectEntryRule, ObjectEtagRule, ObjectModtimeRule, ObjectSizeRule,
};
use vigil_storage_s3::{ObjectClient, ObjectFolder, ObjectMeta, ObjectSearchTerm, ObjectStorage};

use crate::driver::Verification;
use crate::error::VerifyError;
use crate::monitor::PollingParams;

/// Verification client for object-store state.
///
/// # Example
///
/// ```ignore
/// let client = AwsObjectClient::connect("eu-central-1", None)?;
/// let term = ObjectSearchTerm::new("drop", "incoming", Some("report.txt".into()), false, false);
/// let mut verification = ObjectVerification::new(client, term)?;
/// verification.check_size(1024);
/// let matched = verification.verify_object_exists()?;
/// ```
pub struct ObjectVerification<C: ObjectClient> {
    inner: Verification<ObjectFolder<C>>,
}

impl<C: ObjectClient> ObjectVerification<C> {
    /// Verify objects selected by `term` on the store behind `client`.
    pub fn new(client: C, term: ObjectSearchTerm) -> Result<Self, VerifyError> {
        let folder = ObjectStorage::new(client).folder(term)?;
        Ok(Self {
            inner: Verification::new("object_monitor", folder),
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

    /// Check that the object size equals `size` bytes.
    pub fn check_size(&mut self, size: i64) -> &mut Self {
        self.inner.add_rule(ObjectSizeRule::new(size, "check_size", true));
        self
    }

    /// Check that the object size differs from `size` bytes.
    pub fn check_size_different(&mut self, size: i64) -> &mut Self {
        self.inner
            .add_rule(ObjectSizeRule::new(size, "check_size_different", false));
        self
    }

    /// Check that the last-modified timestamp equals `modtime`.
    pub fn check_modification_time(&mut self, modtime: DateTime<Utc>) -> &mut Self {
        self.inner
            .add_rule(ObjectModtimeRule::new(modtime, "check_modification_time", true));
        self
    }

    /// Check that the last-modified timestamp differs from `modtime`.
    pub fn check_modification_time_different(&mut self, modtime: DateTime<Utc>) -> &mut Self {
        self.inner.add_rule(ObjectModtimeRule::new(
            modtime,
            "check_modification_time_different",
            false,
        ));
        self
    }

    /// Check that the entity tag equals `etag`.
    pub fn check_etag(&mut self, etag: impl Into<String>) -> &mut Self {
        self.inner.add_rule(ObjectEtagRule::new(etag, "check_etag", true));
        self
    }

    /// Check that the entity tag differs from `etag`.
    pub fn check_etag_different(&mut self, etag: impl Into<String>) -> &mut Self {
        self.inner
            .add_rule(ObjectEtagRule::new(etag, "check_etag_different", false));
        self
    }

    /// Verify an object with the checked properties exists.
    pub fn verify_object_exists(&mut self) -> Result<Vec<ObjectMeta>, VerifyError> {
        self.add_object_check_rule();
        self.inner.verify_exists()
    }

    /// Verify no object with the checked properties exists right now.
    pub fn verify_object_does_not_exist(&mut self) -> Result<(), VerifyError> {
        self.add_object_check_rule();
        self.inner.verify_does_not_exist()
    }

    /// Verify an object with the checked properties exists for the whole
    /// polling window.
    pub fn verify_object_always_exists(&mut self) -> Result<Vec<ObjectMeta>, VerifyError> {
        self.add_object_check_rule();
        self.inner.verify_always_exists()
    }

    /// Verify no object with the checked properties appears during the
    /// whole polling window.
    pub fn verify_object_never_exists(&mut self) -> Result<(), VerifyError> {
        self.add_object_check_rule();
        self.inner.verify_never_exists()
    }

    fn add_object_check_rule(&mut self) {
        self.inner.add_rule(
            ObjectEntryRule::object("check_is_object", true).with_priority(Priority::HIGHEST),
        );
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use vigil_storage_s3::{MockObjectClient, ObjectRecord};

    use crate::error::VerifyError;

    use super::*;

    fn record(key: &str, modified: &str) -> ObjectRecord {
        ObjectRecord {
            key: key.to_owned(),
            size: 42,
            last_modified: modified.parse().unwrap(),
            etag: "abc123".to_owned(),
        }
    }

    fn fast_params() -> PollingParams {
        PollingParams {
            initial_delay: Duration::ZERO,
            interval: Duration::from_millis(1),
            attempts: 3,
            timeout: Duration::from_secs(10),
        }
    }

    fn verification_with(client: MockObjectClient) -> ObjectVerification<MockObjectClient> {
        let term = ObjectSearchTerm::new(
            "drop",
            "incoming",
            Some("report.txt".to_owned()),
            false,
            false,
        );
        let mut verification = ObjectVerification::new(client, term).unwrap();
        verification.set_polling_params(fast_params());
        verification
    }

    #[test]
    fn test_object_appears_on_second_poll() {
        let client = MockObjectClient::new()
            .with_listing(vec![])
            .with_listing(vec![record("incoming/report.txt", "2026-01-05T10:00:00Z")]);
        let mut verification = verification_with(client);
        verification.check_size(42).check_etag("abc123");

        let matched = verification.verify_object_exists().unwrap();

        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].key().unwrap(), "incoming/report.txt");
    }

    #[test]
    fn test_missing_bucket_counts_as_absent() {
        let client = MockObjectClient::new().with_missing_bucket();
        let mut verification = verification_with(client);

        verification.verify_object_does_not_exist().unwrap();
    }

    #[test]
    fn test_directory_marker_is_not_an_object() {
        let client = MockObjectClient::new()
            .with_listing(vec![record("incoming/report.txt/", "2026-01-05T10:00:00Z")]);
        let mut verification = verification_with(client);

        // the entry-kind rule rejects the directory marker
        assert!(verification.verify_object_exists().is_err());
    }

    #[test]
    fn test_never_exists_fails_when_object_appears() {
        let client = MockObjectClient::new()
            .with_listing(vec![])
            .with_listing(vec![record("incoming/report.txt", "2026-01-05T10:00:00Z")]);
        let mut verification = verification_with(client);

        let err = verification.verify_object_never_exists().unwrap_err();
        assert!(matches!(err, VerifyError::Failed(_)));
    }

    #[test]
    fn test_always_exists_fails_when_object_disappears() {
        let client = MockObjectClient::new()
            .with_listing(vec![record("incoming/report.txt", "2026-01-05T10:00:00Z")])
            .with_listing(vec![])
            .with_listing(vec![record("incoming/report.txt", "2026-01-05T10:00:00Z")]);
        let mut verification = verification_with(client);

        let err = verification.verify_object_always_exists().unwrap_err();
        let failure = match err {
            VerifyError::Failed(failure) => failure,
            other => panic!("expected a verification failure, got {other}"),
        };
        assert_eq!(failure.attempts, 2);
    }

    #[test]
    fn test_negative_checks() {
        let client = MockObjectClient::new()
            .with_listing(vec![record("incoming/report.txt", "2026-01-05T10:00:00Z")]);
        let mut verification = verification_with(client);
        verification.check_size_different(42);

        verification.verify_object_does_not_exist().unwrap();
    }
}
