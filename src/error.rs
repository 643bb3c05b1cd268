//! Error types for the orthogonal set search.
//!
//! Structural problems (bad data, bad configuration) abort before any work
//! is dispatched. Numeric degeneracies are recoverable and absorbed by the
//! dispatcher. Anything else raised inside a worker aborts the whole run.

use thiserror::Error;

/// Errors raised by the search engine.
#[derive(Debug, Error)]
pub enum OrthoError {
    /// The input matrix is malformed (non-rectangular, non-numeric,
    /// non-finite, or carries bad labels).
    #[error("data format error at {location}: {reason}")]
    DataFormat {
        /// Where in the input the problem was found.
        location: String,
        /// What was wrong.
        reason: String,
    },

    /// A sub-matrix could not be scored (zero-norm column, singular matrix).
    #[error("numeric error: {0}")]
    Numeric(String),

    /// A configuration value is out of range for this run.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A worker failed while processing its share of a chunk.
    #[error("worker {worker} failed on chunk {chunk}: {source}")]
    WorkerFailure {
        /// Worker (share) index within the chunk.
        worker: usize,
        /// Zero-based chunk index.
        chunk: usize,
        /// The originating error.
        #[source]
        source: Box<OrthoError>,
    },

    /// A worker panicked; the payload message is preserved.
    #[error("worker panicked: {0}")]
    Panic(String),
}

impl OrthoError {
    /// Shorthand for a [`OrthoError::DataFormat`] error.
    pub fn data_format(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataFormat {
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error is a recoverable numeric degeneracy.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Numeric(_))
    }
}

/// Result alias used throughout the library.
pub type Result<T, E = OrthoError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_failure_keeps_source() {
        let err = OrthoError::WorkerFailure {
            worker: 1,
            chunk: 3,
            source: Box::new(OrthoError::Panic("boom".into())),
        };
        let msg = err.to_string();
        assert!(msg.contains("worker 1"));
        assert!(msg.contains("chunk 3"));
        assert!(msg.contains("boom"));
        let source = std::error::Error::source(&err).expect("source attached");
        assert!(source.to_string().contains("boom"));
    }

    #[test]
    fn test_numeric_is_recoverable() {
        assert!(OrthoError::Numeric("zero norm".into()).is_numeric());
        assert!(!OrthoError::InvalidConfig("p".into()).is_numeric());
    }
}
