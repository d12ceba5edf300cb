use std::path::PathBuf;

use thiserror::Error;

/// Failures that stop an analysis before any events are aggregated.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no files matching {patterns} found in {}", dir.display())]
    NoMatchingFiles { dir: PathBuf, patterns: String },

    #[error("cannot read directory {}: {source}", dir.display())]
    UnreadableDirectory {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A single history file that could not be used. The loader skips it and
/// carries on with the remaining files.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {}: {message}", path.display())]
    MalformedJson { path: PathBuf, message: String },
}

impl FileError {
    pub fn path(&self) -> &PathBuf {
        match self {
            FileError::Read { path, .. } | FileError::MalformedJson { path, .. } => path,
        }
    }
}

/// Why a raw record was not turned into a play event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("unparseable timestamp `{0}`")]
    InvalidTimestamp(String),

    #[error("negative duration ({0} ms)")]
    NegativeDuration(i64),

    #[error("duration is not a whole number of milliseconds")]
    InvalidDuration,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot create export directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize analysis result: {0}")]
    Serialize(String),
}
