//! Error types for initial-state construction.

use kernel::CommitError;
use thiserror::Error;

/// Setup result type alias.
pub type SetupResult<T> = Result<T, SetupError>;

/// Everything that can stop a setup before the solver sees any state.
#[derive(Error, Debug)]
pub enum SetupError {
    /// A configuration value is present but semantically unacceptable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required key is absent and has no default.
    #[error("Missing value [{section}] {key} (entry {index})")]
    MissingKey {
        /// Section name
        section: String,
        /// Key name
        key: String,
        /// Position within the key's value list
        index: usize,
    },

    /// A value exists but cannot be read as the requested type.
    #[error("Invalid value for [{section}] {key} (entry {index}): {reason}")]
    InvalidValue {
        /// Section name
        section: String,
        /// Key name
        key: String,
        /// Position within the key's value list
        index: usize,
        /// Why the value was rejected
        reason: String,
    },

    /// Seeding would write past the allocated particle slots.
    #[error("Seeding needs {required} particle slots but only {capacity} are allocated")]
    CapacityExceeded {
        /// Slots the strategy would write
        required: usize,
        /// Slots available
        capacity: usize,
    },

    /// The execution backend refused the state.
    #[error("Commit failed: {0}")]
    Commit(#[from] CommitError),

    /// IO error while reading an input file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Input file is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
