//! Error types for echo-sleuth.
//!
//! This module defines the error taxonomy using `thiserror` for structured error
//! handling. Errors compose via `?` and `From` conversions inside the crate.
//!
//! # Error Hierarchy
//!
//! - [`ParseError`] - One log line failed to decode (always recovered by skipping)
//! - [`InputError`] - Log file or directory reading failures (missing file, IO)
//! - [`CacheError`] - Fallback index cache read/write failures
//!
//! # Error Recovery Strategy
//!
//! Nothing in the core is fatal. Transcripts are produced by an external process
//! that may crash mid-write, so every public operation degrades to an empty or
//! partial result instead of returning these errors:
//!
//! - **Malformed lines**: skipped silently, never surfaced
//! - **Missing/unreadable files**: logged at debug level, reported as "no results"
//! - **Cache failures**: logged and ignored, the cache is re-derivable
//!
//! These types exist so internal helpers can use `?` and so the recovery point
//! is explicit (one `match` per public operation) rather than scattered.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from decoding a single log line.
///
/// Never surfaced past the reader: a line that fails to decode is skipped.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    /// The line is not valid JSON (often a torn write at the tail of a file).
    #[error("Invalid JSON: {message}")]
    InvalidJson {
        /// Decoder message, with line/column.
        message: String,
    },

    /// The line is valid JSON but not an object.
    #[error("Expected a JSON object, found {found}")]
    NotAnObject {
        /// Kind of value found instead.
        found: &'static str,
    },
}

/// Errors encountered when reading transcripts or log directories.
///
/// # Recovery Patterns
///
/// - **FileNotFound**: report "no results" for the path
/// - **Io**: report "no results", log the OS error for diagnosis
#[derive(Debug, Error)]
pub enum InputError {
    /// The transcript or directory does not exist at the given path.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::PathBuf;
    /// use echo_sleuth::model::error::InputError;
    ///
    /// let err = InputError::FileNotFound {
    ///     path: PathBuf::from("/tmp/missing.jsonl")
    /// };
    /// assert!(err.to_string().contains("/tmp/missing.jsonl"));
    /// ```
    #[error("File not found: {path}")]
    FileNotFound {
        /// The filesystem path that was not found.
        path: PathBuf,
    },

    /// Generic I/O error while opening, seeking or reading.
    ///
    /// Permission denied, a directory where a file was expected, or a read
    /// failure partway through a file all land here.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// Path being read when the failure occurred.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl InputError {
    /// Classify an I/O error raised while touching `path`.
    ///
    /// `NotFound` becomes [`InputError::FileNotFound`] so callers can tell
    /// "nothing there" from "something went wrong".
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            InputError::FileNotFound { path }
        } else {
            InputError::Io { path, source }
        }
    }
}

/// Errors from the fallback index cache file.
///
/// Always recovered locally: a failed read is a cache miss, a failed write
/// means the next call rebuilds again.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Cache file could not be read or written.
    #[error("Cache I/O error at {path}: {source}")]
    Io {
        /// Cache file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Entries could not be encoded for writing.
    #[error("Failed to encode cache file {path}: {source}")]
    Encode {
        /// Cache file path.
        path: PathBuf,
        /// The JSON encode error.
        #[source]
        source: serde_json::Error,
    },

    /// Cache file exists but does not hold a valid entry array.
    #[error("Cache file {path} is corrupt: {source}")]
    Corrupt {
        /// Cache file path.
        path: PathBuf,
        /// The JSON decode error.
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_io_maps_not_found_to_file_not_found() {
        let err = InputError::from_io(
            "/nope.jsonl",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, InputError::FileNotFound { .. }));
    }

    #[test]
    fn from_io_keeps_other_kinds_as_io() {
        let err = InputError::from_io(
            "/locked.jsonl",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        match err {
            InputError::Io { path, source } => {
                assert_eq!(path, PathBuf::from("/locked.jsonl"));
                assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
            }
            other => panic!("Expected Io, got {:?}", other),
        }
    }

    #[test]
    fn cache_error_message_names_the_file() {
        let source = serde_json::from_str::<Vec<u8>>("{").unwrap_err();
        let err = CacheError::Corrupt {
            path: PathBuf::from("/p/.echo-sleuth-index.json"),
            source,
        };
        assert!(err.to_string().contains(".echo-sleuth-index.json"));
    }
}
