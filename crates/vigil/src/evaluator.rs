//! Evaluation strategies applied to each poll's records.
//!
//! [`MetaEvaluator`] is the usual strategy: apply the root rule composite
//! to every record and collect the matches. [`SnapshotEvaluator`] instead
//! verifies that nothing changed *except* what was expected to: records
//! selected by a key rule must satisfy their matching rule, every other
//! record must equal a baseline entry field for field.

use vigil_rules::{Rule, RuleError, RuleOp, RuleReport};
use vigil_storage::MetaData;

/// Outcome of evaluating one poll.
#[derive(Debug)]
pub struct Evaluation<M> {
    /// The records that satisfied the evaluation.
    pub matched: Vec<M>,
    /// For a rule-based evaluation with no matches: the first failing
    /// child rule observed, for failure reports.
    pub failed_rule: Option<RuleReport>,
}

/// Strategy for deciding which of a poll's records satisfy the
/// verification.
pub trait Evaluator<M> {
    /// Evaluate one poll's records.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError`] when a rule cannot be evaluated.
    fn evaluate(&self, metas: &[M]) -> Result<Evaluation<M>, RuleError>;
}

/// Rule-based evaluation: a record matches iff the root composite matches.
pub struct MetaEvaluator<'a, M> {
    root: &'a RuleOp<M>,
}

impl<'a, M> MetaEvaluator<'a, M> {
    /// Evaluate against this root composite.
    #[must_use]
    pub fn new(root: &'a RuleOp<M>) -> Self {
        Self { root }
    }
}

impl<M: Clone> Evaluator<M> for MetaEvaluator<'_, M> {
    fn evaluate(&self, metas: &[M]) -> Result<Evaluation<M>, RuleError> {
        let mut matched = Vec::new();
        let mut failed_rule = None;

        for meta in metas {
            let verdict = self.root.evaluate(meta)?;
            if verdict.matched {
                matched.push(meta.clone());
            } else if failed_rule.is_none() {
                failed_rule = verdict.failed_rule;
            }
        }

        Ok(Evaluation {
            matched,
            failed_rule,
        })
    }
}

struct SnapshotRule<M> {
    key_rule: Box<dyn Rule<M>>,
    matching_rule: Box<dyn Rule<M>>,
    /// Keys the matching rule inspects - the fields expected to change,
    /// excluded from the baseline comparison.
    excluded: Vec<String>,
}

/// Baseline-comparison evaluation.
///
/// Takes a snapshot of records before some external action, then verifies
/// the action changed only what it was supposed to:
///
/// 1. A record selected by a key rule must satisfy that pair's matching
///    rule; the fields the matching rule inspects are expected to differ
///    from the baseline and are skipped in the comparison.
/// 2. Any other record must equal some baseline entry on every field not
///    explicitly excluded. Each baseline entry is consumed by at most one
///    record.
/// 3. Leftover baseline entries mean data disappeared - the evaluation
///    does not match.
pub struct SnapshotEvaluator<M> {
    snapshot: Vec<M>,
    rules: Vec<SnapshotRule<M>>,
    global_rule: Option<RuleOp<M>>,
    excluded_keys: Vec<String>,
}

impl<M: AsRef<MetaData> + Clone> SnapshotEvaluator<M> {
    /// Create an evaluator around a baseline snapshot.
    #[must_use]
    pub fn new(snapshot: Vec<M>) -> Self {
        Self {
            snapshot,
            rules: Vec::new(),
            global_rule: None,
            excluded_keys: Vec::new(),
        }
    }

    /// Register an expected change: records selected by `key_rule` must
    /// satisfy `matching_rule` instead of equaling the baseline on the
    /// fields the matching rule inspects.
    pub fn add_rule(
        &mut self,
        key_rule: impl Rule<M> + 'static,
        matching_rule: impl Rule<M> + 'static,
    ) {
        let excluded = matching_rule.keys();
        self.rules.push(SnapshotRule {
            key_rule: Box::new(key_rule),
            matching_rule: Box::new(matching_rule),
            excluded,
        });
    }

    /// Set a rule applied to records no key rule selects; the fields it
    /// inspects are excluded from their baseline comparison.
    pub fn set_global_rule(&mut self, rule: RuleOp<M>) {
        self.global_rule = Some(rule);
    }

    /// Exclude keys from every baseline comparison (volatile fields such
    /// as timestamps).
    pub fn exclude_keys(&mut self, keys: impl IntoIterator<Item = String>) {
        self.excluded_keys.extend(keys);
    }

    fn match_record(&self, meta: &M, remaining: &mut Vec<M>) -> Result<bool, RuleError> {
        for rule in &self.rules {
            if rule.key_rule.matches(meta)? {
                // selected records must show the expected change; no
                // further key rules are consulted
                if !rule.matching_rule.matches(meta)? {
                    return Ok(false);
                }
                return Ok(self.snapshot_match(meta, &rule.excluded, remaining));
            }
        }

        if let Some(global) = &self.global_rule {
            if !global.matches(meta)? {
                return Ok(false);
            }
            return Ok(self.snapshot_match(meta, &global.keys(), remaining));
        }

        Ok(self.snapshot_match(meta, &[], remaining))
    }

    /// Locate `new_meta` in the remaining baseline entries, consuming the
    /// entry it equals.
    fn snapshot_match(&self, new_meta: &M, rule_excluded: &[String], remaining: &mut Vec<M>) -> bool {
        let new_bag = new_meta.as_ref();

        for index in 0..remaining.len() {
            let entry_bag = remaining[index].as_ref();
            if !same_key_set(entry_bag, new_bag) {
                continue;
            }

            let equal = entry_bag.properties().all(|(key, value)| {
                if self.excluded_keys.iter().any(|k| k == key)
                    || rule_excluded.iter().any(|k| k == key)
                {
                    return true;
                }
                new_bag.get_property(key) == Some(value)
            });

            if equal {
                remaining.remove(index);
                return true;
            }
        }

        tracing::debug!(record = %new_bag, "record not found in baseline snapshot");
        false
    }
}

/// Whether both bags carry exactly the same property keys.
fn same_key_set(a: &MetaData, b: &MetaData) -> bool {
    a.len() == b.len() && a.keys().all(|key| b.get_property(key).is_some())
}

impl<M: AsRef<MetaData> + Clone> Evaluator<M> for SnapshotEvaluator<M> {
    fn evaluate(&self, metas: &[M]) -> Result<Evaluation<M>, RuleError> {
        let mut remaining = self.snapshot.clone();

        for meta in metas {
            if !self.match_record(meta, &mut remaining)? {
                return Ok(Evaluation {
                    matched: Vec::new(),
                    failed_rule: None,
                });
            }
        }

        if !remaining.is_empty() {
            tracing::debug!(
                leftover = remaining.len(),
                "baseline entries missing from the new data"
            );
            return Ok(Evaluation {
                matched: Vec::new(),
                failed_rule: None,
            });
        }

        Ok(Evaluation {
            matched: metas.to_vec(),
            failed_rule: None,
        })
    }
}
