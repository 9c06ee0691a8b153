//! Composite rules with AND/OR semantics.

use std::cmp::Ordering;

use crate::rule::{Priority, Rule, RuleError, RuleReport};

/// How a [`RuleOp`] combines its children.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Match iff every child matches (short-circuits on first non-match).
    All,
    /// Match iff at least one child matches (short-circuits on first match).
    Any,
}

/// Outcome of evaluating a composite against one record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verdict {
    /// Whether the composite matched.
    pub matched: bool,
    /// For a non-matching AND: the first child (in evaluation order) that
    /// did not match. `None` for OR composites and for matches.
    pub failed_rule: Option<RuleReport>,
}

struct Entry<M> {
    seq: u64,
    rule: Box<dyn Rule<M>>,
}

/// A composite [`Rule`] combining child rules with boolean algebra.
///
/// Children are kept sorted by `(priority, name, insertion sequence)`
/// ascending, re-sorted once per mutation, so evaluation order - and thus
/// short-circuit order - is deterministic even when priorities collide.
/// The sequence number is assigned by the composite at insertion and only
/// breaks ties, so two rules with identical name and priority coexist
/// without replacing one another.
///
/// The composite's own priority is the minimum (most urgent) priority of
/// its children; adding a child can only make the composite more urgent,
/// never less.
pub struct RuleOp<M> {
    mode: Mode,
    entries: Vec<Entry<M>>,
    next_seq: u64,
    min_priority: Priority,
}

impl<M> RuleOp<M> {
    /// Create a composite that matches iff **every** child matches.
    ///
    /// With no children it matches vacuously.
    #[must_use]
    pub fn and() -> Self {
        Self::with_mode(Mode::All)
    }

    /// Create a composite that matches iff **at least one** child matches.
    ///
    /// With no children it never matches.
    #[must_use]
    pub fn or() -> Self {
        Self::with_mode(Mode::Any)
    }

    fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            entries: Vec::new(),
            next_seq: 0,
            min_priority: Priority::LOWEST,
        }
    }

    /// Add a child rule.
    pub fn add_rule(&mut self, rule: impl Rule<M> + 'static) -> &mut Self {
        self.add_boxed(Box::new(rule));
        self
    }

    /// Add an already-boxed child rule.
    pub fn add_boxed(&mut self, rule: Box<dyn Rule<M>>) -> &mut Self {
        self.min_priority = self.min_priority.min(rule.priority());
        self.entries.push(Entry {
            seq: self.next_seq,
            rule,
        });
        self.next_seq += 1;
        self.sort_entries();
        self
    }

    /// Add several child rules at once.
    pub fn add_rules(&mut self, rules: Vec<Box<dyn Rule<M>>>) -> &mut Self {
        for rule in rules {
            self.add_boxed(rule);
        }
        self
    }

    /// Remove every child rule.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.min_priority = Priority::LOWEST;
    }

    /// Number of child rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the composite has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn sort_entries(&mut self) {
        self.entries.sort_by(|a, b| {
            a.rule
                .priority()
                .cmp(&b.rule.priority())
                .then_with(|| a.rule.name().cmp(b.rule.name()))
                .then_with(|| a.seq.cmp(&b.seq))
        });
    }

    /// Evaluate the composite against one record.
    ///
    /// For a non-matching AND the verdict names the first failing child,
    /// so verification failures are diagnosable without re-running.
    ///
    /// # Errors
    ///
    /// Propagates the first [`RuleError`] raised by a child.
    pub fn evaluate(&self, meta: &M) -> Result<Verdict, RuleError> {
        match self.mode {
            Mode::All => {
                for entry in &self.entries {
                    if !entry.rule.matches(meta)? {
                        tracing::trace!(rule = entry.rule.name(), "rule did not match");
                        return Ok(Verdict {
                            matched: false,
                            failed_rule: Some(RuleReport::of(entry.rule.as_ref())),
                        });
                    }
                }
                Ok(Verdict {
                    matched: true,
                    failed_rule: None,
                })
            }
            Mode::Any => {
                for entry in &self.entries {
                    if entry.rule.matches(meta)? {
                        return Ok(Verdict {
                            matched: true,
                            failed_rule: None,
                        });
                    }
                }
                Ok(Verdict {
                    matched: false,
                    failed_rule: None,
                })
            }
        }
    }
}

impl<M> Rule<M> for RuleOp<M> {
    fn name(&self) -> &str {
        match self.mode {
            Mode::All => "all-of",
            Mode::Any => "any-of",
        }
    }

    fn priority(&self) -> Priority {
        self.min_priority
    }

    fn perform_match(&self, meta: &M) -> Result<bool, RuleError> {
        Ok(self.evaluate(meta)?.matched)
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for entry in &self.entries {
            for key in entry.rule.keys() {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    fn description(&self) -> String {
        let joiner = match self.mode {
            Mode::All => " and ",
            Mode::Any => " or ",
        };
        let joined = self
            .entries
            .iter()
            .map(|entry| entry.rule.description())
            .collect::<Vec<_>>()
            .join(joiner);
        match self.entries.len().cmp(&1) {
            Ordering::Less => "no rules".to_owned(),
            Ordering::Equal => joined,
            Ordering::Greater => format!("({joined})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use super::*;

    /// Fixed-outcome rule that records whether it was evaluated.
    struct ProbeRule {
        name: String,
        priority: Priority,
        outcome: bool,
        expected: bool,
        evaluated: Rc<Cell<bool>>,
        keys: Vec<String>,
    }

    impl ProbeRule {
        fn new(name: &str, priority: i32, outcome: bool) -> (Self, Rc<Cell<bool>>) {
            let evaluated = Rc::new(Cell::new(false));
            let rule = Self {
                name: name.to_owned(),
                priority: Priority(priority),
                outcome,
                expected: true,
                evaluated: Rc::clone(&evaluated),
                keys: Vec::new(),
            };
            (rule, evaluated)
        }

        fn with_keys(mut self, keys: &[&str]) -> Self {
            self.keys = keys.iter().map(|k| (*k).to_owned()).collect();
            self
        }

        fn negated(mut self) -> Self {
            self.expected = false;
            self
        }
    }

    impl Rule<()> for ProbeRule {
        fn name(&self) -> &str {
            &self.name
        }

        fn priority(&self) -> Priority {
            self.priority
        }

        fn expected(&self) -> bool {
            self.expected
        }

        fn perform_match(&self, _meta: &()) -> Result<bool, RuleError> {
            self.evaluated.set(true);
            Ok(self.outcome)
        }

        fn keys(&self) -> Vec<String> {
            self.keys.clone()
        }

        fn description(&self) -> String {
            format!("probe '{}'", self.name)
        }
    }

    #[test]
    fn test_and_matches_when_all_children_match() {
        let mut op = RuleOp::and();
        op.add_rule(ProbeRule::new("a", 0, true).0);
        op.add_rule(ProbeRule::new("b", 0, true).0);

        assert!(op.matches(&()).unwrap());
    }

    #[test]
    fn test_and_fails_when_one_child_fails() {
        let mut op = RuleOp::and();
        op.add_rule(ProbeRule::new("a", 0, true).0);
        op.add_rule(ProbeRule::new("b", 0, false).0);

        let verdict = op.evaluate(&()).unwrap();
        assert!(!verdict.matched);
        assert_eq!(verdict.failed_rule.unwrap().name, "b");
    }

    #[test]
    fn test_and_short_circuits_in_priority_order() {
        // the failing rule has the more urgent priority, so the passing
        // rule added first must never be evaluated
        let (passing, passing_probe) = ProbeRule::new("late", 10, true);
        let (failing, _) = ProbeRule::new("early", 0, false);

        let mut op = RuleOp::and();
        op.add_rule(passing);
        op.add_rule(failing);

        let verdict = op.evaluate(&()).unwrap();
        assert!(!verdict.matched);
        assert_eq!(verdict.failed_rule.unwrap().name, "early");
        assert!(!passing_probe.get());
    }

    #[test]
    fn test_or_matches_when_one_child_matches() {
        let mut op = RuleOp::or();
        op.add_rule(ProbeRule::new("a", 0, false).0);
        op.add_rule(ProbeRule::new("b", 10, true).0);

        assert!(op.matches(&()).unwrap());
    }

    #[test]
    fn test_or_short_circuits_on_first_match() {
        let (first, _) = ProbeRule::new("early", 0, true);
        let (second, second_probe) = ProbeRule::new("late", 10, true);

        let mut op = RuleOp::or();
        op.add_rule(second);
        op.add_rule(first);

        assert!(op.matches(&()).unwrap());
        assert!(!second_probe.get());
    }

    #[test]
    fn test_or_with_failing_high_priority_still_matches() {
        // mirror of the AND short-circuit pair: R1 (priority 0, false),
        // R2 (priority 10, true) - OR must reach R2 and match
        let mut op = RuleOp::or();
        op.add_rule(ProbeRule::new("r2", 10, true).0);
        op.add_rule(ProbeRule::new("r1", 0, false).0);

        assert!(op.matches(&()).unwrap());
    }

    #[test]
    fn test_empty_and_matches_vacuously() {
        let op: RuleOp<()> = RuleOp::and();
        assert!(op.matches(&()).unwrap());
    }

    #[test]
    fn test_empty_or_never_matches() {
        let op: RuleOp<()> = RuleOp::or();
        assert!(!op.matches(&()).unwrap());
    }

    #[test]
    fn test_same_name_same_priority_rules_both_kept() {
        let (first, first_probe) = ProbeRule::new("twin", 5, true);
        let (second, second_probe) = ProbeRule::new("twin", 5, true);

        let mut op = RuleOp::and();
        op.add_rule(first);
        op.add_rule(second);

        assert_eq!(op.len(), 2);
        assert!(op.matches(&()).unwrap());
        assert!(first_probe.get());
        assert!(second_probe.get());
    }

    #[test]
    fn test_priority_inherits_minimum_of_children() {
        let mut op = RuleOp::and();
        assert_eq!(op.priority(), Priority::LOWEST);

        op.add_rule(ProbeRule::new("a", 5, true).0);
        assert_eq!(op.priority(), Priority(5));

        op.add_rule(ProbeRule::new("b", 2, true).0);
        assert_eq!(op.priority(), Priority(2));

        // adding a less urgent rule never raises the composite's priority
        op.add_rule(ProbeRule::new("c", 10, true).0);
        assert_eq!(op.priority(), Priority(2));
    }

    #[test]
    fn test_clear_resets_children_and_priority() {
        let mut op = RuleOp::and();
        op.add_rule(ProbeRule::new("a", 1, false).0);

        op.clear();

        assert!(op.is_empty());
        assert_eq!(op.priority(), Priority::LOWEST);
        assert!(op.matches(&()).unwrap());
    }

    #[test]
    fn test_keys_union_without_duplicates() {
        let mut op = RuleOp::and();
        op.add_rule(ProbeRule::new("a", 0, true).0.with_keys(&["size", "path"]));
        op.add_rule(ProbeRule::new("b", 1, true).0.with_keys(&["path", "modtime"]));

        assert_eq!(op.keys(), vec!["size", "path", "modtime"]);
    }

    #[test]
    fn test_negated_child_flips_contribution() {
        let mut op = RuleOp::and();
        op.add_rule(ProbeRule::new("a", 0, true).0);
        op.add_rule(ProbeRule::new("b", 1, true).0.negated());

        assert!(!op.matches(&()).unwrap());
    }

    #[test]
    fn test_nested_composites() {
        let mut inner = RuleOp::or();
        inner.add_rule(ProbeRule::new("i1", 0, false).0);
        inner.add_rule(ProbeRule::new("i2", 1, true).0);

        let mut outer = RuleOp::and();
        outer.add_rule(ProbeRule::new("o1", 0, true).0);
        outer.add_rule(inner);

        assert!(outer.matches(&()).unwrap());
    }

    #[test]
    fn test_description_joins_children() {
        let mut op = RuleOp::and();
        op.add_rule(ProbeRule::new("a", 0, true).0);
        op.add_rule(ProbeRule::new("b", 1, true).0);

        assert_eq!(op.description(), "(probe 'a' and probe 'b')");
    }
}
