use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PruneError {
    #[error("Installation root not found: {0}")]
    RootNotFound(PathBuf),

    #[error("Installation root is not a directory: {0}")]
    RootNotADirectory(PathBuf),

    #[error("Ruleset error: {0}")]
    RulesetLoad(String),

    #[error("Failed to remove {path}: {source}")]
    EntryDelete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read metadata for {path}: {source}")]
    EntryStat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Archive error in {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PruneError {
    /// Fatal errors abort the run before anything is deleted.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PruneError::RootNotFound(_)
                | PruneError::RootNotADirectory(_)
                | PruneError::RulesetLoad(_)
                | PruneError::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PruneError>;
