//! Unified error handling for assetbake
//!
//! This module provides the error taxonomy shared by the buffer models,
//! the conversion engine and the container codec.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for all assetbake operations
#[derive(Error, Debug)]
pub enum Error {
    // ==================== I/O Errors ====================

    /// Standard I/O error (write failures, truncated reads)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Source could not be opened; nothing was read or mutated
    #[error("Failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ==================== Format Errors ====================

    /// Invalid signature at the start of a container
    #[error("Invalid magic bytes: expected {expected:?}, found {found:?}")]
    InvalidMagic {
        expected: Vec<u8>,
        found: Vec<u8>,
    },

    /// Container version this reader does not understand
    #[error("Unsupported version: {version} (supported: {supported})")]
    UnsupportedVersion {
        version: u8,
        supported: u8,
    },

    /// Asset-type tag does not match what the reader expects
    #[error("Unexpected asset type: expected {expected}, found tag {found}")]
    UnexpectedAssetType {
        expected: String,
        found: u8,
    },

    /// A declared count is inconsistent with the bytes actually available
    #[error("Size mismatch in {what}: declared {declared} bytes, available {available}")]
    SizeMismatch {
        what: String,
        declared: u64,
        available: u64,
    },

    /// Invalid data structure
    #[error("Invalid data: {message}")]
    InvalidData {
        message: String,
    },

    // ==================== Buffer Errors ====================

    /// Pixel conversion requested for an unsupported layout
    #[error("Unsupported conversion: {message}")]
    UnsupportedConversion {
        message: String,
    },

    /// (slice, mip) outside the allocated grid
    #[error("Cell ({slice}, {mip}) out of range for {array_slices}x{mip_slices} grid")]
    CellOutOfRange {
        slice: usize,
        mip: usize,
        array_slices: usize,
        mip_slices: usize,
    },

    // ==================== General Errors ====================

    /// Custom error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

/// Result type using the unified Error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an error with additional context
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Error::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create an invalid data error
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Error::InvalidData {
            message: message.into(),
        }
    }

    /// Create an unsupported conversion error
    pub fn unsupported_conversion(message: impl Into<String>) -> Self {
        Error::UnsupportedConversion {
            message: message.into(),
        }
    }

    /// Create a size mismatch error
    pub fn size_mismatch(what: impl Into<String>, declared: u64, available: u64) -> Self {
        Error::SizeMismatch {
            what: what.into(),
            declared,
            available,
        }
    }

    /// Strip any context wrappers and return the underlying error
    pub fn root(&self) -> &Error {
        match self {
            Error::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check if the source could not be opened
    pub fn is_open_error(&self) -> bool {
        matches!(self.root(), Error::Open { .. })
    }

    /// Check if this is a signature/version/type mismatch
    pub fn is_format_error(&self) -> bool {
        matches!(
            self.root(),
            Error::InvalidMagic { .. }
                | Error::UnsupportedVersion { .. }
                | Error::UnexpectedAssetType { .. }
        )
    }

    /// Check if a declared size disagreed with the available bytes
    pub fn is_size_mismatch(&self) -> bool {
        matches!(self.root(), Error::SizeMismatch { .. })
    }

    /// Check if this is an unsupported pixel conversion
    pub fn is_unsupported_conversion(&self) -> bool {
        matches!(self.root(), Error::UnsupportedConversion { .. })
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_with_context() {
        let err = Error::invalid_data("bad submesh");
        let contextualized = err.with_context("while reading mesh");

        assert!(contextualized.to_string().contains("while reading mesh"));
        assert!(contextualized.to_string().contains("bad submesh"));
    }

    #[test]
    fn test_is_format_error() {
        assert!(Error::InvalidMagic {
            expected: b"ast".to_vec(),
            found: b"xyz".to_vec(),
        }.is_format_error());
        assert!(Error::UnsupportedVersion { version: 2, supported: 1 }.is_format_error());
        assert!(!Error::invalid_data("x").is_format_error());
    }

    #[test]
    fn test_predicates_see_through_context() {
        let err = Error::size_mismatch("vertex records", 100, 10).with_context("mesh");
        assert!(err.is_size_mismatch());
        assert!(!err.is_format_error());
    }

    #[test]
    fn test_open_error() {
        let err = Error::Open {
            path: PathBuf::from("/missing.ast"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.is_open_error());
        assert!(err.to_string().contains("/missing.ast"));
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::unsupported_conversion("bc1 cell"));
        let with_context = result.context("to_bgra");

        assert!(with_context.is_err());
        let err = with_context.unwrap_err();
        assert!(err.is_unsupported_conversion());
        assert!(err.to_string().contains("to_bgra"));
    }
}
