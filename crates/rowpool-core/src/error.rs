//! Structured error types shared by the table codec and the worker pool.

use std::fmt;
use std::path::Path;

/// Main error type for rowpool operations
#[derive(Debug)]
pub enum Error {
    /// Arguments that violate a call's contract: empty input, mixed row
    /// shapes, unusable headers
    InvalidInput {
        operation: &'static str,
        details: String,
    },
    /// A mapping row lacks a field named in the header
    MissingField { field: String, row: usize },
    /// I/O failures; a missing input file carries `ErrorKind::NotFound`
    Io {
        path: Option<String>,
        source: std::io::Error,
    },
    /// Unknown encoding label, undecodable bytes, or text the target
    /// encoding cannot represent
    Decode {
        encoding: String,
        path: Option<String>,
        details: String,
    },
    /// A named read hit a data line whose field count differs from the header
    SchemaMismatch {
        line: usize,
        expected: usize,
        found: usize,
    },
    /// A worker-side failure on a single item (fail-fast map)
    ItemFailure {
        index: usize,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_input(operation: &'static str, details: impl Into<String>) -> Self {
        Self::InvalidInput {
            operation,
            details: details.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>, row: usize) -> Self {
        Self::MissingField {
            field: field.into(),
            row,
        }
    }

    pub fn from_io(source: std::io::Error, path: Option<&Path>) -> Self {
        Self::Io {
            path: path.map(|p| p.display().to_string()),
            source,
        }
    }

    pub fn decode(encoding: &str, path: Option<&Path>, details: impl Into<String>) -> Self {
        Self::Decode {
            encoding: encoding.to_string(),
            path: path.map(|p| p.display().to_string()),
            details: details.into(),
        }
    }

    pub fn schema_mismatch(line: usize, expected: usize, found: usize) -> Self {
        Self::SchemaMismatch {
            line,
            expected,
            found,
        }
    }

    pub fn item_failure(
        index: usize,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ItemFailure {
            index,
            source: Box::new(source),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidInput { operation, details } => {
                write!(f, "Invalid input to {}: {}", operation, details)
            }
            Error::MissingField { field, row } => {
                write!(f, "Row {} is missing field '{}'", row, field)
            }
            Error::Io { path, source } => {
                write!(f, "I/O error: {}", source)?;
                if let Some(path) = path {
                    write!(f, " (path: {})", path)?;
                }
                Ok(())
            }
            Error::Decode {
                encoding,
                path,
                details,
            } => {
                write!(f, "Decode error for encoding '{}': {}", encoding, details)?;
                if let Some(path) = path {
                    write!(f, " (path: {})", path)?;
                }
                Ok(())
            }
            Error::SchemaMismatch {
                line,
                expected,
                found,
            } => {
                write!(
                    f,
                    "Line {} has {} field(s), expected {} to match the header",
                    line, found, expected
                )
            }
            Error::ItemFailure { index, source } => {
                write!(f, "Item {} failed: {}", index, source)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { source, .. } => Some(source),
            Error::ItemFailure { source, .. } => Some(&**source),
            _ => None,
        }
    }
}
