//! Rewriting of zip-based asset archives (`.iwd`) that the server keeps but
//! that still carry client-only media.

use crate::classify::engine::{is_prefix_of, normalize_extension, normalize_path, split_components};
use crate::classify::{ArchiveRules, Classifier, Ruleset, Verdict};
use crate::error::{PruneError, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use zip::{ZipArchive, ZipWriter};

/// Compiled archive section of a ruleset.
#[derive(Debug)]
pub struct ArchivePolicy {
    suffixes: Vec<String>,
    paths: Vec<Vec<String>>,
    classifier: Classifier,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveOutcome {
    pub entries_total: usize,
    pub entries_removed: u64,
    pub bytes_removed: u64,
}

impl ArchivePolicy {
    pub fn new(rules: &ArchiveRules) -> Result<Self> {
        Ok(Self {
            suffixes: rules.extensions.iter().map(|e| normalize_extension(e)).collect(),
            paths: rules
                .paths
                .iter()
                .map(|p| split_components(&normalize_path(Path::new(p))))
                .collect(),
            classifier: Classifier::new(&rules.rules)?,
        })
    }

    pub fn from_ruleset(ruleset: &Ruleset) -> Result<Option<Self>> {
        ruleset.archive.as_ref().map(Self::new).transpose()
    }

    /// Whether a kept file at this install-relative path is an archive to rewrite.
    pub fn applies_to(&self, relative_path: &Path) -> bool {
        let normalized = normalize_path(relative_path);
        let parts: Vec<&str> = normalized.split('/').collect();
        let Some(name) = parts.last() else {
            return false;
        };

        let is_archive = self
            .suffixes
            .iter()
            .any(|suffix| name.len() > suffix.len() && name.ends_with(suffix.as_str()));
        let in_scope = self.paths.is_empty() || self.paths.iter().any(|p| is_prefix_of(p, &parts));

        is_archive && in_scope
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }
}

/// Drop every entry the classifier marks `Remove` from the archive at `path`.
///
/// Kept entries are raw-copied into a sibling temp file which then replaces
/// the original. Byte counts are the compressed sizes of the dropped
/// entries, so a dry run reports the same figures as a real one.
pub fn prune_archive(path: &Path, classifier: &Classifier, dry_run: bool) -> Result<ArchiveOutcome> {
    let zip_error = |source| PruneError::Archive {
        path: path.to_path_buf(),
        source,
    };

    let mut archive = ZipArchive::new(File::open(path)?).map_err(zip_error)?;
    let mut outcome = ArchiveOutcome {
        entries_total: archive.len(),
        ..Default::default()
    };
    let mut doomed = Vec::new();

    for idx in 0..archive.len() {
        let entry = archive.by_index_raw(idx).map_err(zip_error)?;
        if classifier.classify(entry.name(), entry.is_dir()) == Verdict::Remove {
            log::debug!("{}: dropping {}", path.display(), entry.name());
            doomed.push(idx);
            outcome.entries_removed += 1;
            outcome.bytes_removed += entry.compressed_size();
        }
    }

    if doomed.is_empty() || dry_run {
        return Ok(outcome);
    }

    let temp_path = temp_path_for(path);
    let written = write_without(&mut archive, &doomed, &temp_path);
    drop(archive);

    let result = written.and_then(|_| fs::rename(&temp_path, path).map_err(PruneError::from));
    if let Err(e) = result {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    Ok(outcome)
}

fn write_without(archive: &mut ZipArchive<File>, doomed: &[usize], temp_path: &Path) -> Result<()> {
    let zip_error = |source| PruneError::Archive {
        path: temp_path.to_path_buf(),
        source,
    };

    let mut writer = ZipWriter::new(File::create(temp_path)?);
    for idx in 0..archive.len() {
        if doomed.binary_search(&idx).is_ok() {
            continue;
        }
        let entry = archive.by_index_raw(idx).map_err(zip_error)?;
        writer.raw_copy_file(entry).map_err(zip_error)?;
    }
    writer.finish().map_err(zip_error)?;
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    const ARCHIVE_RULES: &str = r#"
        [archive]
        extensions = ["iwd"]
        paths = ["main"]

        [archive.rules.media_folders]
        type = "prefix"
        prefixes = ["images", "sound"]
        verdict = "remove"

        [archive.rules.music]
        type = "extension"
        extensions = ["mp3"]
        verdict = "remove"
    "#;

    fn policy() -> ArchivePolicy {
        let ruleset = Ruleset::from_toml(ARCHIVE_RULES).unwrap();
        ArchivePolicy::from_ruleset(&ruleset).unwrap().unwrap()
    }

    fn write_archive(path: &Path, entries: &[(&str, &str)]) {
        let mut writer = ZipWriter::new(File::create(path).unwrap());
        for (name, data) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(data.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    fn entry_names(path: &Path) -> Vec<String> {
        let archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        archive.file_names().map(str::to_string).collect()
    }

    #[test]
    fn test_applies_to_scoped_paths() {
        let policy = policy();
        assert!(policy.applies_to(Path::new("main/iw_00.iwd")));
        assert!(policy.applies_to(Path::new("MAIN/IW_00.IWD")));
        assert!(!policy.applies_to(Path::new("mods/iw_00.iwd")));
        assert!(!policy.applies_to(Path::new("main/iw_00.ff")));
    }

    #[test]
    fn test_rewrites_without_media() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("iw_00.iwd");
        write_archive(
            &path,
            &[
                ("images/wall.iwi", "texture bytes"),
                ("sound/gun.wav", "sound bytes"),
                ("maps/mp/mp_rust.gsc", "main() {}"),
                ("music/menu.mp3", "music"),
            ],
        );

        let outcome = prune_archive(&path, policy().classifier(), false).unwrap();

        assert_eq!(outcome.entries_total, 4);
        assert_eq!(outcome.entries_removed, 3);
        assert!(outcome.bytes_removed > 0);
        assert_eq!(entry_names(&path), vec!["maps/mp/mp_rust.gsc"]);
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn test_dry_run_leaves_archive_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("iw_01.iwd");
        write_archive(&path, &[("images/a.iwi", "a"), ("maps/b.gsc", "b")]);
        let before = fs::read(&path).unwrap();

        let outcome = prune_archive(&path, policy().classifier(), true).unwrap();

        assert_eq!(outcome.entries_removed, 1);
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_nothing_to_drop() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("iw_02.iwd");
        write_archive(&path, &[("maps/b.gsc", "b")]);
        let before = fs::read(&path).unwrap();

        let outcome = prune_archive(&path, policy().classifier(), false).unwrap();

        assert_eq!(outcome.entries_removed, 0);
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_corrupt_archive_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.iwd");
        fs::write(&path, b"not a zip file").unwrap();

        let err = prune_archive(&path, policy().classifier(), false).unwrap_err();
        assert!(matches!(err, PruneError::Archive { .. }));
        assert_eq!(fs::read(&path).unwrap(), b"not a zip file");
    }
}
