//! Error types for staged-load imports
//!
//! Executor failures are carried through unchanged unless the active dialect
//! recognises the message as a known backend condition, in which case they
//! are reclassified so callers do not need backend-specific knowledge.

use crate::executor::ExecutorError;

/// Error type for import operations
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// Staging and destination definitions do not line up, or the requested
    /// statement cannot be built from them
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Backend and option combination that is deliberately not implemented
    #[error("Unsupported operation on {backend}: {operation}")]
    Unsupported {
        /// Dialect name
        backend: &'static str,
        /// What was requested
        operation: String,
    },

    /// Statement failed on the executor and was not reclassified
    #[error("Statement failed: {source}")]
    Execution {
        /// SQL text that failed
        sql: String,
        /// Executor failure
        #[source]
        source: ExecutorError,
    },

    /// A file or object referenced by the load does not exist
    #[error("Load error, source not found: {message}")]
    MissingSource {
        /// Backend message
        message: String,
        /// Executor failure
        #[source]
        source: ExecutorError,
    },

    /// Source values could not be stored in the destination
    #[error("Load error, invalid source data: {message}")]
    InvalidSourceData {
        /// Backend message
        message: String,
        /// Executor failure
        #[source]
        source: ExecutorError,
    },

    /// ROLLBACK kept failing after the original transaction failure
    #[error("Rollback failed after {attempts} attempts ({rollback}); original failure: {original}")]
    RollbackFailed {
        /// The failure that forced the rollback
        #[source]
        original: Box<ImportError>,
        /// Last rollback failure
        rollback: ExecutorError,
        /// Attempts made
        attempts: u32,
    },

    /// Configuration file could not be read or parsed
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type for import operations
pub type ImportResult<T> = Result<T, ImportError>;

/// Coarse class of a backend error message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Referenced file or object is missing
    MissingSource,
    /// Value conversion, NOT NULL or row size failure
    InvalidSourceData,
    /// Anything else; surfaced verbatim
    Other,
}

impl ImportError {
    /// Build an import error from an executor failure using a classification
    pub fn from_execution(sql: &str, source: ExecutorError, class: ErrorClass) -> Self {
        match class {
            ErrorClass::MissingSource => ImportError::MissingSource {
                message: source.message().to_string(),
                source,
            },
            ErrorClass::InvalidSourceData => ImportError::InvalidSourceData {
                message: source.message().to_string(),
                source,
            },
            ErrorClass::Other => ImportError::Execution {
                sql: sql.to_string(),
                source,
            },
        }
    }

    /// The failure that caused this error, skipping rollback wrappers
    pub fn primary_cause(&self) -> &ImportError {
        match self {
            ImportError::RollbackFailed { original, .. } => original.primary_cause(),
            other => other,
        }
    }

    /// Whether the error stems from the definitions or options
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ImportError::Configuration(_) | ImportError::Unsupported { .. }
        )
    }
}
