use crate::classify::Verdict;
use crate::error::PruneError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::FileType;
use std::path::{Path, PathBuf};

/// Filesystem node type as seen without following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    Other,
}

impl EntryKind {
    pub fn from_file_type(file_type: FileType) -> Self {
        if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Directory => "dir",
            EntryKind::Symlink => "symlink",
            EntryKind::Other => "other",
        }
    }
}

/// What happened to an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Removed,
    Kept,
    Failed,
    Rewritten,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Removed => "removed",
            Action::Kept => "kept",
            Action::Failed => "failed",
            Action::Rewritten => "rewritten",
        }
    }
}

/// Per-entry decision, collected in verbose runs.
#[derive(Debug, Clone, Serialize)]
pub struct EntryOutcome {
    pub path: PathBuf,
    pub kind: EntryKind,
    pub verdict: Verdict,
    pub action: Action,
    pub rule: Option<String>,
    pub bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryIssue {
    pub path: PathBuf,
    pub message: String,
}

/// Summary of one pruning run. In a dry run every count describes what a
/// real run would have done.
#[derive(Debug, Clone, Serialize)]
pub struct PruneReport {
    pub root: PathBuf,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub files_removed: u64,
    pub dirs_removed: u64,
    pub bytes_reclaimed: u64,
    pub files_kept: u64,
    pub archives_rewritten: u64,
    pub archive_entries_removed: u64,
    /// Compressed bytes dropped from rewritten archives. Kept apart from
    /// `bytes_reclaimed`, which only counts deleted files.
    pub archive_bytes_removed: u64,
    pub errors: Vec<EntryIssue>,
    pub warnings: Vec<EntryIssue>,
    pub outcomes: Vec<EntryOutcome>,
}

impl PruneReport {
    pub fn new(root: PathBuf, dry_run: bool) -> Self {
        Self {
            root,
            dry_run,
            started_at: Utc::now(),
            finished_at: None,
            files_removed: 0,
            dirs_removed: 0,
            bytes_reclaimed: 0,
            files_kept: 0,
            archives_rewritten: 0,
            archive_entries_removed: 0,
            archive_bytes_removed: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
            outcomes: Vec::new(),
        }
    }

    pub(crate) fn record_file_removed(&mut self, bytes: u64) {
        self.files_removed += 1;
        self.bytes_reclaimed += bytes;
    }

    pub(crate) fn record_dir_removed(&mut self) {
        self.dirs_removed += 1;
    }

    pub(crate) fn record_file_kept(&mut self) {
        self.files_kept += 1;
    }

    pub(crate) fn record_archive_rewritten(&mut self, entries: u64, bytes: u64) {
        self.archives_rewritten += 1;
        self.archive_entries_removed += entries;
        self.archive_bytes_removed += bytes;
    }

    pub(crate) fn record_error(&mut self, path: &Path, error: &PruneError) {
        self.errors.push(EntryIssue {
            path: path.to_path_buf(),
            message: error.to_string(),
        });
    }

    pub(crate) fn record_warning(&mut self, path: &Path, message: String) {
        self.warnings.push(EntryIssue {
            path: path.to_path_buf(),
            message,
        });
    }

    pub(crate) fn push_outcome(&mut self, outcome: EntryOutcome) {
        self.outcomes.push(outcome);
    }

    pub(crate) fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Relative paths of every entry the run removed (or would remove).
    pub fn removed_paths(&self) -> impl Iterator<Item = &Path> {
        self.outcomes
            .iter()
            .filter(|o| o.action == Action::Removed)
            .map(|o| o.path.as_path())
    }

    pub fn duration(&self) -> Option<std::time::Duration> {
        self.finished_at
            .and_then(|end| (end - self.started_at).to_std().ok())
    }
}
