pub mod engine;
pub mod rules;

pub use engine::{Classifier, RuleMatch};
pub use rules::{ArchiveRules, Matcher, Rule, Ruleset, Verdict};
