//! Error types shared by the JSON file backend.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Convenient result alias returning [`FileDaoError`] failures.
pub type FileResult<T> = Result<T, FileDaoError>;

/// Failures that can occur while reading or writing the document file.
#[derive(Debug, Error)]
pub enum FileDaoError {
    /// The document file exists but could not be read.
    #[error("failed to read document file `{}`", path.display())]
    Read {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
    /// The data directory could not be created.
    #[error("failed to create data directory `{}`", path.display())]
    CreateDir {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
    /// Writing the temporary document file failed.
    #[error("failed to write document file `{}`", path.display())]
    Write {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
    /// Moving the temporary file over the document failed.
    #[error("failed to replace document file `{}`", path.display())]
    Replace {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
    /// The file content is not a valid JSON document.
    #[error("failed to decode document file `{}`", path.display())]
    Decode {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: serde_json::Error,
    },
    /// The in-memory document could not be encoded.
    #[error("failed to encode document for `{}`", path.display())]
    Encode {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: serde_json::Error,
    },
}
