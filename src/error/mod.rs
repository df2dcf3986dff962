//! Error types for autoquant-fusion
//!
//! Matching itself never fails; these errors come from building inputs
//! (traces, module trees, pattern catalogs) and from JSON I/O.

use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum FusionError {
    /// Pattern catalog without any pattern
    #[error("Pattern catalog is empty")]
    EmptyCatalog,

    /// Pattern without any op type
    #[error("Fusion pattern #{index} is empty")]
    EmptyPattern {
        /// Position of the pattern in the catalog
        index: usize,
    },

    /// Two seen ops recorded under the same trace index
    #[error("Duplicate trace index: {0}")]
    DuplicateTraceIndex(usize),

    /// Submodule lookup by FQN failed
    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    /// Child module name that cannot be part of an FQN
    #[error("Invalid module name: '{0}'")]
    InvalidModuleName(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for fallible operations
pub type FusionResult<T> = Result<T, FusionError>;
