use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a `dirsnap` run.
///
/// Problems with individual files never show up here; the content reader turns
/// them into placeholders (see [`ReadFailure`]).
#[derive(Error, Debug)]
pub enum SnapError {
    /// The root given in `SnapshotConfig` does not exist or cannot be accessed.
    #[error("Root path not found or not accessible: {0}")]
    RootNotFound(PathBuf),

    /// The root exists but is not a directory.
    #[error("Root path is not a directory: {0}")]
    RootNotADirectory(PathBuf),

    /// An I/O error occurred while accessing a path (canonicalizing the root, for instance).
    #[error("IO error accessing path '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The final report could not be created or written.
    #[error("Failed to write report to '{path}': {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A convenience type alias for `Result<T, SnapError>`.
pub type SnapResult<T> = Result<T, SnapError>;

/// Why the content of a single file could not be included in the report.
#[derive(Error, Debug)]
pub enum ReadFailure {
    /// The bytes look like binary data rather than text.
    #[error("content is not readable as text")]
    Undecodable,

    /// Opening or reading the file failed.
    #[error("{0}")]
    Io(#[from] io::Error),

    /// Anything else, e.g. the path is a FIFO or a directory and was never opened.
    #[error("{0}")]
    Other(String),
}
