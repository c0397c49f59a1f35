pub mod classify;
pub mod config;
pub mod error;
pub mod prune;
pub mod util;

pub use classify::{ArchiveRules, Classifier, Matcher, Rule, RuleMatch, Ruleset, Verdict};
pub use config::Config;
pub use error::{PruneError, Result};
pub use prune::{
    prune_archive, run, validate_root, Action, ArchiveOutcome, ArchivePolicy, EntryIssue,
    EntryKind, EntryOutcome, PruneOptions, PruneReport, Pruner,
};
