//! # Error Module
//!
//! Error types for the image consolidator.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths and the underlying I/O or decode failure
//! - **Isolate failures** - only configuration errors abort a run; everything
//!   else is scoped to one file or one group

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum ConsolidatorError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Hashing error: {0}")]
    Hash(#[from] HashError),

    #[error("Grouping error: {0}")]
    Index(#[from] IndexError),

    #[error("Consolidation error: {0}")]
    Consolidate(#[from] ConsolidateError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors that occur while discovering image files
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while computing a signature.
///
/// A file that fails here is never classified and never touched.
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Failed to decode image {path}: {reason}")]
    DecodeError { path: PathBuf, reason: String },

    #[error("Image is empty: {path}")]
    EmptyImage { path: PathBuf },

    #[error("Failed to open image file {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the dedup index
#[derive(Error, Debug, PartialEq, Eq)]
pub enum IndexError {
    #[error("{path} carries a {found} signature but the index groups by {expected}")]
    ModeMismatch {
        path: PathBuf,
        expected: &'static str,
        found: &'static str,
    },
}

/// Errors that occur while moving survivors and deleting duplicates
#[derive(Error, Debug)]
pub enum ConsolidateError {
    #[error("Failed to copy {source_path} to {destination}: {source}")]
    Copy {
        source_path: PathBuf,
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Refusing to overwrite existing file {path}")]
    DestinationExists { path: PathBuf },

    #[error("Survivor {path} is missing, duplicates left in place")]
    SurvivorMissing { path: PathBuf },

    #[error("Failed to delete {path}: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid consolidation plan: {0}")]
    InvalidPlan(String),
}

impl ConsolidateError {
    /// Whether this error aborted a group rather than a single delete
    pub fn aborts_group(&self) -> bool {
        !matches!(self, ConsolidateError::Delete { .. })
    }
}

/// Errors in the run configuration. These are the only fatal errors and are
/// raised before any file is moved or deleted.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("At least one directory to compare is required")]
    NoDirectories,

    #[error("Path {path} is not a directory or doesn't exist")]
    NotADirectory { path: PathBuf },

    #[error("Failed to create output directory {path}: {source}")]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to resolve {path}: {source}")]
    Canonicalize {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker count must be at least 1")]
    ZeroJobs,

    #[error("Invalid hash size: {value} (must be 4-64)")]
    InvalidHashSize { value: u32 },

    #[error("Failed to start worker pool: {0}")]
    ThreadPool(String),
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, ConsolidatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_error_includes_path() {
        let error = ScanError::DirectoryNotFound {
            path: PathBuf::from("/photos/vacation"),
        };
        assert!(error.to_string().contains("/photos/vacation"));
    }

    #[test]
    fn hash_error_includes_path_and_reason() {
        let error = HashError::DecodeError {
            path: PathBuf::from("/photos/broken.jpg"),
            reason: "invalid JPEG".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("/photos/broken.jpg"));
        assert!(message.contains("invalid JPEG"));
    }

    #[test]
    fn delete_error_does_not_abort_group() {
        let delete = ConsolidateError::Delete {
            path: PathBuf::from("/a.png"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let missing = ConsolidateError::SurvivorMissing {
            path: PathBuf::from("/b.png"),
        };
        assert!(!delete.aborts_group());
        assert!(missing.aborts_group());
    }

    #[test]
    fn config_error_converts_to_top_level() {
        let error: ConsolidatorError = ConfigError::NoDirectories.into();
        assert!(matches!(error, ConsolidatorError::Config(_)));
        assert!(error.to_string().contains("At least one directory"));
    }
}
