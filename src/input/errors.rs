//! Input definition error types
//!
//! Error codes:
//! - INPUT_INVALID_NAME (Name)
//! - INPUT_IO_ERROR (Io)
//! - INPUT_DECODE_FAILED (Decode)
//! - INPUT_FRAME_REQUIRED, INPUT_UNKNOWN_DESTINATION, INPUT_MISSING_VALUE_MAP,
//!   INPUT_MISSING_ROW_ID, INPUT_DUPLICATE_ROW_ID, INPUT_DUPLICATE_PRIMARY_KEY
//!   (Validation)
//! - INPUT_INVALID_JSON (Json)

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Broad classes of failure, so callers can branch without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Definition name rejected by the naming grammar
    Name,
    /// Directory creation, file read or file write failed
    Io,
    /// Persisted bytes could not be parsed
    Decode,
    /// Structural or referential rule violated
    Validation,
    /// Creation payload was not valid JSON for the expected shape
    Json,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Name => write!(f, "NAME"),
            ErrorCategory::Io => write!(f, "IO"),
            ErrorCategory::Decode => write!(f, "DECODE"),
            ErrorCategory::Validation => write!(f, "VALIDATION"),
            ErrorCategory::Json => write!(f, "JSON"),
        }
    }
}

/// Reasons a persisted definition cannot be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("payload truncated: needed {needed} bytes at offset {offset}, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("bad magic bytes: {found:02x?}")]
    BadMagic { found: [u8; 4] },

    #[error("unsupported format version: {0}")]
    UnsupportedVersion(u8),

    #[error("checksum mismatch: computed {computed:08x}, stored {stored:08x}")]
    ChecksumMismatch { computed: u32, stored: u32 },

    #[error("invalid UTF-8 at offset {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("invalid flag byte {value} at offset {offset}")]
    InvalidFlag { offset: usize, value: u8 },

    #[error("body length {declared} does not match payload ({actual} bytes)")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("{0} trailing bytes after body")]
    TrailingBytes(usize),
}

/// Every failure surfaced by the input definition subsystem.
#[derive(Debug, Error)]
pub enum InputDefinitionError {
    #[error("invalid name: '{name}'")]
    InvalidName { name: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot decode input definition{}: {source}", display_path(.path))]
    Decode {
        path: Option<PathBuf>,
        #[source]
        source: DecodeError,
    },

    #[error("field '{field}': frame required")]
    FrameRequired { field: String },

    #[error("field '{field}': invalid value destination: {value}")]
    UnknownDestination { field: String, value: String },

    #[error("field '{field}': valueMap required for mapping into frame '{frame}'")]
    MissingValueMap { field: String, frame: String },

    #[error("field '{field}': rowID required for single-row-boolean into frame '{frame}'")]
    MissingRowId { field: String, frame: String },

    #[error(
        "field '{field}': duplicate rowID {row_id} in frame '{frame}' (already used by field '{conflicting_field}')"
    )]
    DuplicateRowId {
        frame: String,
        row_id: u64,
        field: String,
        conflicting_field: String,
    },

    #[error("field '{field}': duplicate primaryKey (already set on field '{existing}')")]
    DuplicatePrimaryKey { field: String, existing: String },

    #[error("invalid input definition JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn display_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" {}", p.display()))
        .unwrap_or_default()
}

impl InputDefinitionError {
    /// Wrap an I/O failure with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns the stable string code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidName { .. } => "INPUT_INVALID_NAME",
            Self::Io { .. } => "INPUT_IO_ERROR",
            Self::Decode { .. } => "INPUT_DECODE_FAILED",
            Self::FrameRequired { .. } => "INPUT_FRAME_REQUIRED",
            Self::UnknownDestination { .. } => "INPUT_UNKNOWN_DESTINATION",
            Self::MissingValueMap { .. } => "INPUT_MISSING_VALUE_MAP",
            Self::MissingRowId { .. } => "INPUT_MISSING_ROW_ID",
            Self::DuplicateRowId { .. } => "INPUT_DUPLICATE_ROW_ID",
            Self::DuplicatePrimaryKey { .. } => "INPUT_DUPLICATE_PRIMARY_KEY",
            Self::Json(_) => "INPUT_INVALID_JSON",
        }
    }

    /// Returns the category this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidName { .. } => ErrorCategory::Name,
            Self::Io { .. } => ErrorCategory::Io,
            Self::Decode { .. } => ErrorCategory::Decode,
            Self::Json(_) => ErrorCategory::Json,
            Self::FrameRequired { .. }
            | Self::UnknownDestination { .. }
            | Self::MissingValueMap { .. }
            | Self::MissingRowId { .. }
            | Self::DuplicateRowId { .. }
            | Self::DuplicatePrimaryKey { .. } => ErrorCategory::Validation,
        }
    }

    /// Returns whether this error is a schema rule violation.
    pub fn is_validation(&self) -> bool {
        self.category() == ErrorCategory::Validation
    }
}

impl From<DecodeError> for InputDefinitionError {
    fn from(source: DecodeError) -> Self {
        Self::Decode { path: None, source }
    }
}

/// Result type for input definition operations
pub type InputResult<T> = Result<T, InputDefinitionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = InputDefinitionError::FrameRequired { field: "f".into() };
        assert_eq!(err.code(), "INPUT_FRAME_REQUIRED");
        assert_eq!(err.category(), ErrorCategory::Validation);

        let err = InputDefinitionError::InvalidName { name: "Bad".into() };
        assert_eq!(err.code(), "INPUT_INVALID_NAME");
        assert!(!err.is_validation());
    }

    #[test]
    fn test_io_error_includes_path() {
        let err = InputDefinitionError::io(
            "/tmp/defs/users",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.category(), ErrorCategory::Io);
        assert!(err.to_string().contains("/tmp/defs/users"));
    }

    #[test]
    fn test_duplicate_row_id_message_names_both_fields() {
        let err = InputDefinitionError::DuplicateRowId {
            frame: "flags".into(),
            row_id: 7,
            field: "active".into(),
            conflicting_field: "enabled".into(),
        };
        let display = err.to_string();
        assert!(display.contains("flags"));
        assert!(display.contains("active"));
        assert!(display.contains("enabled"));
        assert!(display.contains('7'));
    }

    #[test]
    fn test_decode_error_converts_without_path() {
        let err: InputDefinitionError = DecodeError::UnsupportedVersion(9).into();
        assert_eq!(err.category(), ErrorCategory::Decode);
        assert_eq!(
            err.to_string(),
            "cannot decode input definition: unsupported format version: 9"
        );
    }
}
