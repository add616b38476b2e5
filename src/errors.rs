//! Error types for quakeview.
//!
//! Uses `thiserror` for library-style error definitions.

use thiserror::Error;

/// Errors that can occur in quakeview operations.
#[derive(Error, Debug)]
pub enum QuakeViewError {
    /// Reading an input file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing failed
    #[error("Failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A record or feature carried a timestamp we could not read
    #[error("Invalid timestamp '{0}'")]
    Timestamp(String),

    /// Event validation failed
    #[error("Invalid event data: {0}")]
    Validation(String),

    /// Date window input was not a positive number
    #[error("Invalid date window '{0}': expected a positive number of days")]
    DateWindow(String),

    /// A session script line could not be decoded
    #[error("Invalid script input on line {line}: {source}")]
    Script {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}
