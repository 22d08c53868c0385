// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Core error types for rpmowner
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The external query program could not be started
    #[error("Failed to start {}: {}", .program.display(), .source)]
    CommandSpawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The external query program did not finish in time and was killed
    #[error("{} timed out after {}s", .program.display(), .timeout_secs)]
    CommandTimeout { program: PathBuf, timeout_secs: u64 },

    /// The external query program exited with a non-zero status
    #[error("{} exited with code {}", .program.display(), .exit_code)]
    CommandFailed { program: PathBuf, exit_code: i32 },

    /// Output could not be interpreted
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Result type alias using rpmowner's Error type
pub type Result<T> = std::result::Result<T, Error>;
