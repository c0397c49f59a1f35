use crate::classify::Ruleset;
use crate::error::{PruneError, Result};
use std::path::{Path, PathBuf};

/// Environment variable naming an external ruleset file.
pub const RULES_ENV: &str = "SERVERSLIM_RULES";

pub struct Config {
    pub root: PathBuf,
    pub rules_path: Option<PathBuf>,
}

impl Config {
    /// Resolve the installation root and ruleset location.
    ///
    /// The root defaults to the current directory and is canonicalized. The
    /// ruleset comes from the override, then `SERVERSLIM_RULES`, then the
    /// built-in rules.
    pub fn new(root_override: Option<PathBuf>, rules_override: Option<PathBuf>) -> Result<Self> {
        let root = match root_override {
            Some(path) => path,
            None => std::env::current_dir()?,
        };
        let root = resolve_root(&root)?;

        let rules_path = rules_override.or_else(|| {
            std::env::var_os(RULES_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        });

        Ok(Self { root, rules_path })
    }

    pub fn load_ruleset(&self) -> Result<Ruleset> {
        match &self.rules_path {
            Some(path) => {
                log::info!("Loading rules from {}", path.display());
                Ruleset::from_file(path)
            }
            None => Ruleset::builtin(),
        }
    }
}

fn resolve_root(root: &Path) -> Result<PathBuf> {
    crate::prune::validate_root(root)?;
    root.canonicalize().map_err(PruneError::from)
}
