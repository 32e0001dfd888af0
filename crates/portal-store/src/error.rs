//! Store errors

use std::path::PathBuf;

/// Errors from any read or write against the store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Row does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Write would violate a uniqueness rule
    #[error("conflict: {0}")]
    Conflict(String),

    /// IO error on the backing file
    #[error("io error on {path}: {source}")]
    Io {
        /// File being read or written
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Backing document could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Remote backend refused or failed the request
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Create not-found error for a row
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if error means the row is missing
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = StoreError::not_found("project", "42");
        assert_eq!(err.to_string(), "project not found: 42");
        assert!(err.is_not_found());
    }

    #[test]
    fn conflict_is_not_not_found() {
        assert!(!StoreError::Conflict("email taken".into()).is_not_found());
    }
}
