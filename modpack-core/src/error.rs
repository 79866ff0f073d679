use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModpackError {
    #[error("not a mod: {} does not exist or is not a directory", path.display())]
    NotAMod { path: PathBuf },

    #[error("mod directory {} contains no regular files", path.display())]
    EmptyModDirectory { path: PathBuf },

    #[error("invalid mod structure: {0}")]
    InvalidModStructure(String),

    #[error("unsupported hash type: {0}")]
    UnsupportedHashType(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("compression failure: {0}")]
    Compression(#[source] std::io::Error),

    #[error("corrupt archive: {0}")]
    Corrupt(String),

    #[error("archive failed verification ({failed} entries did not match)")]
    NotIntact { failed: usize },

    #[error("operation cancelled")]
    Cancelled,
}

impl ModpackError {
    pub(crate) fn structure(msg: impl Into<String>) -> Self {
        Self::InvalidModStructure(msg.into())
    }

    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        Self::Corrupt(msg.into())
    }
}

// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, ModpackError>;
