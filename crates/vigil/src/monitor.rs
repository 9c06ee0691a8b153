//! The synchronous poll loop behind the temporal verification methods.

use std::time::{Duration, Instant};

use vigil_config::PollingConfig;
use vigil_rules::RuleReport;
use vigil_storage::Matchable;

use crate::error::{Failure, VerifyError};
use crate::evaluator::{Evaluation, Evaluator};

/// Timing knobs of one verification run.
///
/// The loop ends when either the attempt budget or the wall-clock timeout
/// is exhausted, whichever comes first. Defaults come from
/// [`PollingConfig`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollingParams {
    /// Delay before the first poll.
    pub initial_delay: Duration,
    /// Sleep between polls.
    pub interval: Duration,
    /// Maximum number of polls.
    pub attempts: u32,
    /// Overall wall-clock deadline, checked at the top of each iteration.
    pub timeout: Duration,
}

impl Default for PollingParams {
    fn default() -> Self {
        PollingConfig::default().into()
    }
}

impl From<PollingConfig> for PollingParams {
    fn from(config: PollingConfig) -> Self {
        Self {
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            interval: Duration::from_millis(config.interval_ms),
            attempts: config.attempts,
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }
}

/// The temporal condition a run verifies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Expectation {
    /// Succeed at the first poll with a match; fail when the window ends
    /// without one.
    Exists,
    /// Once a poll has matched, every later poll must match too; a window
    /// with no matching poll at all fails.
    AlwaysExists,
    /// Fail at the first poll with a match; succeed when the window ends
    /// without one.
    NeverExists,
    /// One immediate poll with no match, no polling window.
    DoesNotExist,
}

/// Drives one verification run: opens the folder, polls it on the calling
/// thread, hands each snapshot to the evaluator and applies the temporal
/// semantics. The folder is closed on every exit path.
///
/// No background threads are involved; suspension happens only in the
/// sleeps between polls. Run monitors for independent folders from
/// separate threads if you need concurrent verifications.
pub struct Monitor<'a, F: Matchable, E> {
    name: &'a str,
    folder: &'a mut F,
    evaluator: &'a E,
    params: &'a PollingParams,
}

impl<'a, F, E> Monitor<'a, F, E>
where
    F: Matchable,
    E: Evaluator<F::Meta>,
{
    /// Create a monitor over one folder and one evaluation strategy.
    pub fn new(
        name: &'a str,
        folder: &'a mut F,
        evaluator: &'a E,
        params: &'a PollingParams,
    ) -> Self {
        Self {
            name,
            folder,
            evaluator,
            params,
        }
    }

    /// Poll until the evaluator matches at least one record, or the
    /// window ends.
    pub fn verify_exists(&mut self) -> Result<Vec<F::Meta>, VerifyError> {
        self.run(Expectation::Exists)
    }

    /// Poll until the window ends; once a poll has matched, every later
    /// poll must keep matching.
    pub fn verify_always_exists(&mut self) -> Result<Vec<F::Meta>, VerifyError> {
        self.run(Expectation::AlwaysExists)
    }

    /// Poll until the window ends; any matching poll fails immediately.
    pub fn verify_never_exists(&mut self) -> Result<(), VerifyError> {
        self.run(Expectation::NeverExists).map(|_| ())
    }

    /// Check the current snapshot once, immediately; a match fails.
    pub fn verify_does_not_exist(&mut self) -> Result<(), VerifyError> {
        self.run(Expectation::DoesNotExist).map(|_| ())
    }

    fn run(&mut self, expectation: Expectation) -> Result<Vec<F::Meta>, VerifyError> {
        tracing::info!(
            monitor = self.name,
            folder = %self.folder.description(),
            mode = ?expectation,
            "starting verification"
        );

        self.folder.open()?;
        let outcome = self.poll_loop(expectation);
        if let Err(close_err) = self.folder.close() {
            if outcome.is_ok() {
                return Err(close_err.into());
            }
            tracing::warn!(
                monitor = self.name,
                error = %close_err,
                "close failed after verification error"
            );
        }
        outcome
    }

    fn poll_loop(&mut self, expectation: Expectation) -> Result<Vec<F::Meta>, VerifyError> {
        let target = self.folder.description();

        if expectation == Expectation::DoesNotExist {
            let evaluation = self.poll(1)?;
            return if evaluation.matched.is_empty() {
                Ok(Vec::new())
            } else {
                Err(self.failure(
                    1,
                    format!("expected to not find {target}, but found it"),
                    None,
                ))
            };
        }

        let deadline = Instant::now() + self.params.timeout;
        if !self.params.initial_delay.is_zero() {
            std::thread::sleep(self.params.initial_delay);
        }

        let mut attempts_done = 0u32;
        let mut matched_ever = false;
        let mut last_matched: Vec<F::Meta> = Vec::new();
        let mut last_failed_rule: Option<RuleReport> = None;

        while attempts_done < self.params.attempts && Instant::now() < deadline {
            attempts_done += 1;
            let evaluation = self.poll(attempts_done)?;

            match expectation {
                Expectation::Exists => {
                    if !evaluation.matched.is_empty() {
                        return Ok(evaluation.matched);
                    }
                    last_failed_rule = evaluation.failed_rule;
                }
                Expectation::AlwaysExists => {
                    if !evaluation.matched.is_empty() {
                        matched_ever = true;
                        last_matched = evaluation.matched;
                    } else if matched_ever {
                        return Err(self.failure(
                            attempts_done,
                            format!(
                                "expected to find {target} on every poll, \
                                 but it was gone on attempt {attempts_done}"
                            ),
                            evaluation.failed_rule,
                        ));
                    } else {
                        last_failed_rule = evaluation.failed_rule;
                    }
                }
                Expectation::NeverExists => {
                    if !evaluation.matched.is_empty() {
                        return Err(self.failure(
                            attempts_done,
                            format!(
                                "expected to never find {target}, \
                                 but found it on attempt {attempts_done}"
                            ),
                            None,
                        ));
                    }
                }
                Expectation::DoesNotExist => unreachable!("handled above"),
            }

            if attempts_done < self.params.attempts {
                std::thread::sleep(self.params.interval);
            }
        }

        match expectation {
            Expectation::Exists => Err(self.failure(
                attempts_done,
                format!("expected to find {target}, but did not find it"),
                last_failed_rule,
            )),
            Expectation::AlwaysExists => {
                if matched_ever {
                    Ok(last_matched)
                } else {
                    Err(self.failure(
                        attempts_done,
                        format!("expected to find {target} on every poll, but never found it"),
                        last_failed_rule,
                    ))
                }
            }
            Expectation::NeverExists => Ok(Vec::new()),
            Expectation::DoesNotExist => unreachable!("handled above"),
        }
    }

    fn poll(&mut self, attempt: u32) -> Result<Evaluation<F::Meta>, VerifyError> {
        tracing::debug!(
            monitor = self.name,
            attempt,
            attempts_left = self.params.attempts.saturating_sub(attempt),
            "polling {}",
            self.folder.description()
        );

        let metas = self.folder.all_meta_data()?;
        if let Ok(counts) = self.folder.meta_data_counts() {
            tracing::debug!(monitor = self.name, %counts, "poll complete");
        }

        Ok(self.evaluator.evaluate(&metas)?)
    }

    fn failure(&self, attempts: u32, reason: String, failed_rule: Option<RuleReport>) -> VerifyError {
        VerifyError::Failed(Failure {
            monitor: self.name.to_owned(),
            reason,
            failed_rule,
            attempts,
        })
    }
}
