//! Filesystem verification driver.

use std::path::Path;

use chrono::{DateTime, Utc};
use vigil_rules::Priority;
use vigil_storage::Storage;
use vigil_storage_fs::rules::{
    FileChecksumRule, FileContentRule, FileEntryRule, FileGidRule, FileModtimeRule, FilePermRule,
    FileSizeRule, FileUidRule,
};
use vigil_storage_fs::{FileFolder, FileMeta, FileSearchTerm, FileStorage};

use crate::driver::Verification;
use crate::error::VerifyError;
use crate::monitor::PollingParams;

/// Verification client for file and folder state.
///
/// `check_*` calls add rules; the actual evaluation happens in one of the
/// `verify_*` methods, which also add the entry-kind check at the highest
/// priority so it short-circuits everything else.
///
/// # Example
///
/// ```ignore
/// let mut verification = FileVerification::new("/out/report.txt")?;
/// verification.check_size(1024).check_content("rows:", false, true)?;
/// let matched = verification.verify_file_exists()?;
/// ```
pub struct FileVerification {
    inner: Verification<FileFolder>,
}

impl FileVerification {
    /// Verify the file or folder at exactly `path`.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, VerifyError> {
        Self::with_term(FileSearchTerm::exact(path))
    }

    /// Verify entries in `directory` whose name matches `name` - a
    /// regular expression when `is_regex` is set, an exact name
    /// otherwise, every entry when absent.
    pub fn in_directory(
        directory: impl Into<std::path::PathBuf>,
        name: Option<String>,
        is_regex: bool,
        recursive: bool,
    ) -> Result<Self, VerifyError> {
        Self::with_term(FileSearchTerm::new(directory, name, is_regex, recursive))
    }

    fn with_term(term: FileSearchTerm) -> Result<Self, VerifyError> {
        let folder = FileStorage::new().folder(term)?;
        Ok(Self {
            inner: Verification::new("file_monitor", folder),
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

    /// Check that the entry size equals `size` bytes.
    pub fn check_size(&mut self, size: u64) -> &mut Self {
        self.inner.add_rule(FileSizeRule::new(size, "check_size", true));
        self
    }

    /// Check that the entry size differs from `size` bytes.
    pub fn check_size_different(&mut self, size: u64) -> &mut Self {
        self.inner
            .add_rule(FileSizeRule::new(size, "check_size_different", false));
        self
    }

    /// Check that the modification time equals `modtime`.
    pub fn check_modification_time(&mut self, modtime: DateTime<Utc>) -> &mut Self {
        self.inner
            .add_rule(FileModtimeRule::new(modtime, "check_modification_time", true));
        self
    }

    /// Check that the modification time differs from `modtime`.
    pub fn check_modification_time_different(&mut self, modtime: DateTime<Utc>) -> &mut Self {
        self.inner.add_rule(FileModtimeRule::new(
            modtime,
            "check_modification_time_different",
            false,
        ));
        self
    }

    /// Check that the entry is owned by `uid` (not supported on Windows).
    pub fn check_uid(&mut self, uid: i64) -> &mut Self {
        self.inner.add_rule(FileUidRule::new(uid, "check_uid", true));
        self
    }

    /// Check that the entry belongs to group `gid` (not supported on
    /// Windows).
    pub fn check_gid(&mut self, gid: i64) -> &mut Self {
        self.inner.add_rule(FileGidRule::new(gid, "check_gid", true));
        self
    }

    /// Check that the entry carries exactly these permission bits (not
    /// supported on Windows).
    pub fn check_permissions(&mut self, permissions: i64) -> &mut Self {
        self.inner
            .add_rule(FilePermRule::new(permissions, "check_permissions", true));
        self
    }

    /// Check whether the content contains an expression - a regular
    /// expression when `is_regex` is set, a literal substring otherwise.
    /// `expected` makes this a positive or a negative check.
    pub fn check_content(
        &mut self,
        expression: impl Into<String>,
        is_regex: bool,
        expected: bool,
    ) -> Result<&mut Self, VerifyError> {
        let rule = FileContentRule::new(expression, is_regex, "check_content", expected)?;
        self.inner.add_rule(rule);
        Ok(self)
    }

    /// Check that the content digest equals `checksum` (hex SHA-256).
    pub fn check_checksum(&mut self, checksum: impl Into<String>) -> &mut Self {
        self.inner
            .add_rule(FileChecksumRule::new(checksum, "check_checksum", true));
        self
    }

    /// Check that the content digest differs from `checksum`.
    pub fn check_checksum_different(&mut self, checksum: impl Into<String>) -> &mut Self {
        self.inner.add_rule(FileChecksumRule::new(
            checksum,
            "check_checksum_different",
            false,
        ));
        self
    }

    /// Verify a file with the checked properties exists.
    pub fn verify_file_exists(&mut self) -> Result<Vec<FileMeta>, VerifyError> {
        self.add_file_check_rule();
        self.inner.verify_exists()
    }

    /// Verify no file with the checked properties exists right now.
    pub fn verify_file_does_not_exist(&mut self) -> Result<(), VerifyError> {
        self.add_file_check_rule();
        self.inner.verify_does_not_exist()
    }

    /// Verify a file with the checked properties exists for the whole
    /// polling window.
    pub fn verify_file_always_exists(&mut self) -> Result<Vec<FileMeta>, VerifyError> {
        self.add_file_check_rule();
        self.inner.verify_always_exists()
    }

    /// Verify no file with the checked properties appears during the
    /// whole polling window.
    pub fn verify_file_never_exists(&mut self) -> Result<(), VerifyError> {
        self.add_file_check_rule();
        self.inner.verify_never_exists()
    }

    /// Verify a folder with the checked properties exists.
    pub fn verify_folder_exists(&mut self) -> Result<Vec<FileMeta>, VerifyError> {
        self.add_folder_check_rule();
        self.inner.verify_exists()
    }

    /// Verify no folder with the checked properties exists right now.
    pub fn verify_folder_does_not_exist(&mut self) -> Result<(), VerifyError> {
        self.add_folder_check_rule();
        self.inner.verify_does_not_exist()
    }

    /// Verify a folder with the checked properties exists for the whole
    /// polling window.
    pub fn verify_folder_always_exists(&mut self) -> Result<Vec<FileMeta>, VerifyError> {
        self.add_folder_check_rule();
        self.inner.verify_always_exists()
    }

    /// Verify no folder with the checked properties appears during the
    /// whole polling window.
    pub fn verify_folder_never_exists(&mut self) -> Result<(), VerifyError> {
        self.add_folder_check_rule();
        self.inner.verify_never_exists()
    }

    fn add_file_check_rule(&mut self) {
        // if the path is right, whether the entry is a file at all is the
        // next most discriminating check, so it runs first
        self.inner.add_rule(
            FileEntryRule::file("check_is_file", true).with_priority(Priority::HIGHEST),
        );
    }

    fn add_folder_check_rule(&mut self) {
        self.inner.add_rule(
            FileEntryRule::directory("check_is_directory", true).with_priority(Priority::HIGHEST),
        );
    }
}
