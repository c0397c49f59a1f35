#![allow(dead_code)]

use serverslim_lib::{Classifier, Ruleset};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const SERVER_RULES: &str = r#"
    [rules.binaries]
    type = "extension"
    extensions = ["exe", "dll"]
    verdict = "keep"
    priority = 100

    [rules.config]
    type = "extension"
    extensions = ["cfg"]
    verdict = "keep"
    priority = 100

    [rules.textures]
    type = "extension"
    extensions = ["dds"]
    verdict = "remove"

    [rules.audio]
    type = "extension"
    extensions = ["wav"]
    verdict = "remove"

    [rules.cinematics]
    type = "prefix"
    prefixes = ["main/video"]
    verdict = "remove"
    priority = 200
"#;

pub fn classifier(toml: &str) -> Classifier {
    let ruleset = Ruleset::from_toml(toml).unwrap();
    Classifier::new(&ruleset.rules).unwrap()
}

/// Temporary installation tree.
pub struct TreeFixture {
    pub temp_dir: TempDir,
}

impl TreeFixture {
    pub fn new() -> Self {
        Self {
            temp_dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Build a tree from `(relative path, contents)` pairs.
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let fixture = Self::new();
        for (path, contents) in files {
            fixture.write(path, contents);
        }
        fixture
    }

    /// The `/bin`, `/textures`, `/sound`, `/config` install used across tests.
    pub fn server_install() -> Self {
        Self::with_files(&[
            ("bin/server.exe", "MZ server binary"),
            ("textures/wall.dds", "DDS texture data"),
            ("sound/gun.wav", "RIFF wave"),
            ("config/server.cfg", "set sv_hostname test"),
        ])
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    pub fn write(&self, rel: &str, contents: &str) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    pub fn mkdir(&self, rel: &str) {
        fs::create_dir_all(self.path(rel)).unwrap();
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).symlink_metadata().is_ok()
    }

    /// Sorted relative paths of every entry under the root.
    pub fn listing(&self) -> Vec<String> {
        let mut entries: Vec<String> = walkdir::WalkDir::new(self.root())
            .min_depth(1)
            .follow_links(false)
            .into_iter()
            .map(|e| {
                e.unwrap()
                    .path()
                    .strip_prefix(self.root())
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        entries.sort();
        entries
    }
}
