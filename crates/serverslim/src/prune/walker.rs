use super::archive::{prune_archive, ArchivePolicy};
use super::report::{Action, EntryKind, EntryOutcome, PruneReport};
use crate::classify::{Classifier, RuleMatch, Verdict};
use crate::error::{PruneError, Result};
use crate::util::format_megabytes;
use indicatif::ProgressBar;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Options for a pruning run
#[derive(Debug, Clone)]
pub struct PruneOptions {
    /// Classify and count without touching the filesystem
    pub dry_run: bool,
    /// Collect a per-entry outcome list in the report
    pub verbose: bool,
    /// Remove subtrees covered by a directory rule without classifying each file
    pub bulk_directories: bool,
    /// Rewrite kept asset archives without their removable entries
    pub prune_archives: bool,
}

impl Default for PruneOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            verbose: false,
            bulk_directories: true,
            prune_archives: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fate {
    Removed,
    Kept,
    Failed,
}

/// Prune `root` with `classifier` and return the report.
pub fn run<P: AsRef<Path>>(root: P, classifier: &Classifier, options: PruneOptions) -> Result<PruneReport> {
    Pruner::new(root, classifier, options).run()
}

/// Fails unless `root` exists and is a directory.
pub fn validate_root(root: &Path) -> Result<()> {
    match fs::metadata(root) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(PruneError::RootNotADirectory(root.to_path_buf())),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(PruneError::RootNotFound(root.to_path_buf())),
        Err(e) => Err(PruneError::Io(e)),
    }
}

/// Depth-first, post-order walk over an installation that removes every
/// entry the classifier marks `Remove`.
///
/// Each directory is considered only after all of its children. It is
/// removed when nothing beneath it was kept or failed, and either something
/// beneath it was removed or a directory rule covers it. Directories that
/// were already empty are left alone unless a rule covers them. Symlinks are
/// never followed. A failed delete is recorded and the walk continues.
///
/// The walk assumes nothing else writes to the installation while it runs.
pub struct Pruner<'a> {
    root: PathBuf,
    classifier: &'a Classifier,
    archives: Option<&'a ArchivePolicy>,
    options: PruneOptions,
    progress: Option<ProgressBar>,
    report: PruneReport,
}

impl<'a> Pruner<'a> {
    pub fn new<P: AsRef<Path>>(root: P, classifier: &'a Classifier, options: PruneOptions) -> Self {
        let root = root.as_ref().to_path_buf();
        let report = PruneReport::new(root.clone(), options.dry_run);
        Self {
            root,
            classifier,
            archives: None,
            options,
            progress: None,
            report,
        }
    }

    pub fn with_archives(mut self, policy: &'a ArchivePolicy) -> Self {
        self.archives = Some(policy);
        self
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn run(mut self) -> Result<PruneReport> {
        validate_root(&self.root)?;

        log::info!(
            "{} {}",
            if self.options.dry_run { "Dry run over" } else { "Pruning" },
            self.root.display()
        );

        let root = self.root.clone();
        self.prune_dir(&root, Path::new(""), None);

        if let Some(pb) = self.progress.take() {
            pb.finish_and_clear();
        }
        self.report.finish();

        log::info!(
            "Removed {} files and {} directories ({}), kept {} files, {} errors",
            self.report.files_removed,
            self.report.dirs_removed,
            format_megabytes(self.report.bytes_reclaimed),
            self.report.files_kept,
            self.report.error_count()
        );

        Ok(self.report)
    }

    fn prune_dir(&mut self, dir: &Path, rel: &Path, cover: Option<RuleMatch<'a>>) -> Fate {
        let mut removed = 0usize;
        let mut kept = 0usize;
        let mut failed = 0usize;
        let mut failed_here = 0usize;
        let classifier = self.classifier;

        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = self.relative(e.path().unwrap_or(dir));
                    let err = PruneError::EntryStat {
                        path: path.clone(),
                        source: e.into(),
                    };
                    log::warn!("{}", err);
                    self.report.record_warning(&path, format!("{}; left in place", err));
                    self.report.record_file_kept();
                    self.note(&path, EntryKind::Other, Verdict::Keep, Action::Kept, None, 0);
                    kept += 1;
                    continue;
                }
            };

            let child_rel = rel.join(entry.file_name());
            self.tick(&child_rel);
            let kind = EntryKind::from_file_type(entry.file_type());

            let fate = if kind == EntryKind::Directory {
                let child_cover = cover.or_else(|| {
                    if self.options.bulk_directories {
                        classifier.explain(&child_rel, true)
                    } else {
                        None
                    }
                });
                self.prune_dir(entry.path(), &child_rel, child_cover)
            } else {
                let matched = cover.or_else(|| classifier.explain(&child_rel, false));
                let fate = self.prune_leaf(entry.path(), &child_rel, kind, matched);
                if fate == Fate::Failed {
                    failed_here += 1;
                }
                fate
            };

            match fate {
                Fate::Removed => removed += 1,
                Fate::Kept => kept += 1,
                Fate::Failed => failed += 1,
            }
        }

        if rel.as_os_str().is_empty() || kept > 0 {
            return Fate::Kept;
        }

        if failed > 0 {
            if failed_here > 0 {
                let message = format!(
                    "left in place: {} entries beneath could not be removed",
                    failed_here
                );
                log::warn!("{}: {}", rel.display(), message);
                self.report.record_warning(rel, message);
            }
            return Fate::Failed;
        }

        // The directory's own verdict decides even when bulk removal is off.
        let own = cover.or_else(|| classifier.explain(rel, true));
        if removed == 0 && own.is_none() {
            return Fate::Kept;
        }

        self.remove_dir(dir, rel, own)
    }

    fn prune_leaf(
        &mut self,
        path: &Path,
        rel: &Path,
        kind: EntryKind,
        matched: Option<RuleMatch<'a>>,
    ) -> Fate {
        let verdict = matched.map_or(Verdict::Keep, |m| m.verdict.or_keep());
        if verdict != Verdict::Remove {
            return self.keep_leaf(path, rel, kind, matched);
        }

        // Size right before the unlink, so the report matches what was freed.
        let size = match fs::symlink_metadata(path) {
            Ok(_) if kind == EntryKind::Symlink => 0,
            Ok(meta) => meta.len(),
            Err(source) => {
                let err = PruneError::EntryStat {
                    path: rel.to_path_buf(),
                    source,
                };
                log::warn!("{}", err);
                self.report.record_warning(rel, format!("{}; kept", err));
                self.report.record_file_kept();
                self.note(rel, kind, Verdict::Keep, Action::Kept, matched, 0);
                return Fate::Kept;
            }
        };

        if !self.options.dry_run {
            if let Err(source) = fs::remove_file(path) {
                let err = PruneError::EntryDelete {
                    path: rel.to_path_buf(),
                    source,
                };
                log::warn!("{}", err);
                self.report.record_error(rel, &err);
                self.note(rel, kind, Verdict::Remove, Action::Failed, matched, size);
                return Fate::Failed;
            }
        }

        log::debug!("removed {} ({} bytes)", rel.display(), size);
        self.report.record_file_removed(size);
        self.note(rel, kind, Verdict::Remove, Action::Removed, matched, size);
        Fate::Removed
    }

    fn keep_leaf(
        &mut self,
        path: &Path,
        rel: &Path,
        kind: EntryKind,
        matched: Option<RuleMatch<'a>>,
    ) -> Fate {
        self.report.record_file_kept();

        let mut action = Action::Kept;
        let mut bytes = 0;

        let policy = self
            .archives
            .filter(|p| self.options.prune_archives && kind == EntryKind::File && p.applies_to(rel));
        if let Some(policy) = policy {
            match prune_archive(path, policy.classifier(), self.options.dry_run) {
                Ok(outcome) if outcome.entries_removed > 0 => {
                    log::info!(
                        "{}: dropped {} of {} archive entries",
                        rel.display(),
                        outcome.entries_removed,
                        outcome.entries_total
                    );
                    self.report
                        .record_archive_rewritten(outcome.entries_removed, outcome.bytes_removed);
                    action = Action::Rewritten;
                    bytes = outcome.bytes_removed;
                }
                Ok(_) => {}
                Err(err) => {
                    log::warn!("{}", err);
                    self.report.record_error(rel, &err);
                }
            }
        }

        self.note(rel, kind, Verdict::Keep, action, matched, bytes);
        Fate::Kept
    }

    fn remove_dir(&mut self, dir: &Path, rel: &Path, cover: Option<RuleMatch<'a>>) -> Fate {
        if !self.options.dry_run {
            if let Err(source) = fs::remove_dir(dir) {
                let err = PruneError::EntryDelete {
                    path: rel.to_path_buf(),
                    source,
                };
                log::warn!("{}", err);
                self.report.record_error(rel, &err);
                self.note(rel, EntryKind::Directory, Verdict::Remove, Action::Failed, cover, 0);
                return Fate::Failed;
            }
        }

        log::debug!("removed directory {}", rel.display());
        self.report.record_dir_removed();
        self.note(rel, EntryKind::Directory, Verdict::Remove, Action::Removed, cover, 0);
        Fate::Removed
    }

    fn note(
        &mut self,
        rel: &Path,
        kind: EntryKind,
        verdict: Verdict,
        action: Action,
        matched: Option<RuleMatch<'_>>,
        bytes: u64,
    ) {
        if !self.options.verbose {
            return;
        }
        self.report.push_outcome(EntryOutcome {
            path: rel.to_path_buf(),
            kind,
            verdict,
            action,
            rule: matched.map(|m| m.rule.to_string()),
            bytes,
        });
    }

    fn tick(&self, rel: &Path) {
        if let Some(pb) = &self.progress {
            pb.set_message(rel.display().to_string());
            pb.inc(1);
        }
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root).unwrap_or(path).to_path_buf()
    }
}
