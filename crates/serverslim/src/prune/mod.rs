pub mod archive;
pub mod report;
pub mod walker;

pub use archive::{prune_archive, ArchiveOutcome, ArchivePolicy};
pub use report::{Action, EntryIssue, EntryKind, EntryOutcome, PruneReport};
pub use walker::{run, validate_root, PruneOptions, Pruner};
