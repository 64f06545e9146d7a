//! Error types for schema database operations.
//!
//! Provides a unified error type covering all failure modes: I/O, schema
//! deserialization, symbol resolution, `.config` parsing, and dependency
//! checking.

use std::path::PathBuf;

use confmerge_core::{DependencyError, SymbolError};
use thiserror::Error;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Schema file extension is neither JSON nor YAML.
    #[error("unsupported schema format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// Invalid symbol definition (duplicate name, bad default value).
    #[error("invalid symbol definition: {0}")]
    Symbol(#[from] SymbolError),

    /// A dependency expression names a symbol the schema does not define.
    #[error("unknown symbol {name} referenced by {referenced_by}")]
    UnknownSymbol { name: String, referenced_by: String },

    /// Malformed line in a `.config` fragment.
    #[error("{origin}:{line}: {message}")]
    Parse {
        origin: String,
        line: usize,
        message: String,
    },

    /// The configured symbol prefix does not form a valid pattern.
    #[error("invalid config prefix: {0}")]
    InvalidPrefix(#[from] regex::Error),

    /// Dependency check or repair failure.
    #[error(transparent)]
    Dependency(#[from] DependencyError),
}

/// Convenience alias for results with [`DatabaseError`].
pub type Result<T> = std::result::Result<T, DatabaseError>;
