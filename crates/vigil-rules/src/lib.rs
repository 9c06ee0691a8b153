//! Boolean rule algebra for the Vigil verification engine.
//!
//! A [`Rule`] is an atomic predicate over one observation record, carrying a
//! name, an expected outcome, and a priority. [`RuleOp`] composes rules with
//! AND/OR semantics: children are evaluated in ascending priority order with
//! deterministic tie-breaking, short-circuiting so that cheap discriminating
//! checks can run before expensive ones.
//!
//! Rules are generic over the record type `M`, so a rule written for one
//! backend's records cannot be mixed into another backend's rule set - the
//! type system enforces what used to be a runtime subtype check.
//!
//! # Example
//!
//! ```ignore
//! let mut root = RuleOp::and();
//! root.add_rule(FileSizeRule::new(1024, "check_size", true));
//! root.add_rule(FileEntryRule::file("check_is_file", true));
//! let verdict = root.evaluate(&meta)?;
//! ```

mod op;
pub mod props;
mod rule;

pub use op::{RuleOp, Verdict};
pub use rule::{Priority, Rule, RuleError, RuleReport};
