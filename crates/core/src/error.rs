//! Error types for the station core.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Result type alias using the station error type.
pub type Result<T> = std::result::Result<T, StationError>;

/// Errors surfaced by station construction, sales and persistence.
#[derive(Error, Debug)]
pub enum StationError {
    /// Constructor input rejected (pump count, names, prices, stock).
    #[error("invalid station setup: {0}")]
    InvalidSetup(String),

    /// The named fuel type is not part of the catalog.
    #[error("unknown fuel type \"{0}\"")]
    UnknownFuelType(String),

    /// Pump number outside `[0, count)`.
    #[error("pump {index} out of range (station has {count} pumps)")]
    PumpOutOfRange {
        /// Requested pump number.
        index: usize,
        /// Number of pumps in the station.
        count: usize,
    },

    /// Sale request with a non-positive or non-finite amount.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// A persisted record could not be parsed.
    #[error("malformed state at line {line}: {reason}")]
    MalformedState {
        /// 1-based line number of the offending record.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// The persisted state file does not exist.
    #[error("state file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// The persisted state file exists but could not be read.
    #[error("failed to read {}", path.display())]
    ReadFailure {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The persistence target could not be written.
    #[error("failed to write {}", path.display())]
    WriteFailure {
        /// File being written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl StationError {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedState {
            line,
            reason: reason.into(),
        }
    }
}
