pub mod blacklist;
pub mod frequency;
pub mod manager;
pub mod wordlist;

pub use blacklist::Blacklist;
pub use frequency::FrequencyTable;

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or writing word lists and tables.
#[derive(Debug, Error)]
pub enum DictError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read word data: {0}")]
    Read(#[from] std::io::Error),

    #[error("invalid FST data: {0}")]
    Fst(#[from] fst::Error),

    #[error("stored key is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl DictError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DictError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = DictError> = std::result::Result<T, E>;
