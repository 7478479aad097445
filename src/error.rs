//! Error types for Switchboard
//!
//! Provides structured error handling with:
//! - Numeric error codes for machine parsing
//! - User-friendly messages with suggestions
//! - Exit codes for CLI
//!
//! Note that "no persona matched" and "no command detected" are not errors.
//! Those outcomes are ordinary return values of the router and the matcher.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for switchboard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Numeric error codes for machine parsing and documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Configuration errors (1xx)
    ConfigNotFound = 100,
    ConfigParseError = 101,
    ConfigValidation = 102,

    // IO errors (2xx)
    IoRead = 200,
    IoWrite = 201,
    IoPermission = 202,
    IoNotFound = 203,

    // Catalog errors (3xx)
    CatalogParse = 300,
    CatalogInvalid = 301,
    PersonaNotFound = 302,

    // Storage errors (4xx)
    StorageRead = 400,
    StorageWrite = 401,
    StorageConflict = 402,
    StorageCorrupted = 403,

    // Internal errors (9xx)
    InternalError = 900,
}

impl ErrorCode {
    /// Get the string code (e.g., "E100")
    pub fn as_str(&self) -> String {
        format!("E{}", *self as u16)
    }

    /// Get the exit code for CLI (maps to 1-125 range)
    pub fn exit_code(&self) -> i32 {
        match *self as u16 {
            100..=199 => 10, // Config errors
            200..=299 => 20, // IO errors
            300..=399 => 30, // Catalog errors
            400..=499 => 40, // Storage errors
            900..=999 => 90, // Internal errors
            _ => 1,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type
#[derive(Error, Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration parse error
    #[error("Failed to parse configuration: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<toml::de::Error>,
    },

    /// Configuration validation error
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String, field: Option<String> },

    /// Generic configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    // ─────────────────────────────────────────────────────────────
    // IO Errors
    // ─────────────────────────────────────────────────────────────

    /// File read error
    #[error("Failed to read file: {path}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File write error
    #[error("Failed to write file: {path}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Catalog Errors
    // ─────────────────────────────────────────────────────────────

    /// Persona catalog could not be parsed
    #[error("Failed to parse persona catalog: {message}")]
    CatalogParse {
        message: String,
        #[source]
        source: Option<toml::de::Error>,
    },

    /// Persona catalog parsed but violates a catalog invariant
    #[error("Invalid persona catalog: {reason}")]
    CatalogInvalid { reason: String },

    /// Persona id not present in the catalog
    #[error("Persona not found: {id}")]
    PersonaNotFound { id: String },

    // ─────────────────────────────────────────────────────────────
    // Storage Errors
    // ─────────────────────────────────────────────────────────────

    /// Relationship store read failed
    #[error("Relationship store read failed: {message}")]
    StorageRead { message: String },

    /// Relationship store write failed
    #[error("Relationship store write failed: {message}")]
    StorageWrite { message: String },

    /// Stored record changed between read and write
    #[error("Concurrent update on {user_id}/{persona_id}")]
    StorageConflict { user_id: String, persona_id: String },

    /// Stored data could not be decoded
    #[error("Relationship store is corrupted: {message}")]
    StorageCorrupted { message: String },

    // ─────────────────────────────────────────────────────────────
    // Internal Errors
    // ─────────────────────────────────────────────────────────────

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    // ─────────────────────────────────────────────────────────────
    // Error Classification
    // ─────────────────────────────────────────────────────────────

    /// Get the numeric error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Error::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Error::ConfigValidation { .. } => ErrorCode::ConfigValidation,
            Error::Config(_) => ErrorCode::ConfigValidation,

            Error::IoRead { .. } => ErrorCode::IoRead,
            Error::IoWrite { .. } => ErrorCode::IoWrite,
            Error::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => ErrorCode::IoNotFound,
                std::io::ErrorKind::PermissionDenied => ErrorCode::IoPermission,
                _ => ErrorCode::IoRead,
            },
            Error::Toml(_) => ErrorCode::ConfigParseError,
            Error::Json(_) => ErrorCode::StorageCorrupted,

            Error::CatalogParse { .. } => ErrorCode::CatalogParse,
            Error::CatalogInvalid { .. } => ErrorCode::CatalogInvalid,
            Error::PersonaNotFound { .. } => ErrorCode::PersonaNotFound,

            Error::StorageRead { .. } => ErrorCode::StorageRead,
            Error::StorageWrite { .. } => ErrorCode::StorageWrite,
            Error::StorageConflict { .. } => ErrorCode::StorageConflict,
            Error::StorageCorrupted { .. } => ErrorCode::StorageCorrupted,

            Error::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Whether repeating the operation against fresh state can succeed.
    ///
    /// Only a lost compare-and-swap qualifies; read and write failures are
    /// reported once and not retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::StorageConflict { .. })
    }

    /// Get the exit code for CLI
    pub fn exit_code(&self) -> i32 {
        self.code().exit_code()
    }

    // ─────────────────────────────────────────────────────────────
    // User-Friendly Messages
    // ─────────────────────────────────────────────────────────────

    /// Get a user-friendly suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::ConfigNotFound { .. } => Some(
                "Run 'switchboard config init' to create a default configuration file."
            ),
            Error::ConfigParse { .. } => Some(
                "Check your configuration file syntax. Run 'switchboard config validate' to see details."
            ),
            Error::ConfigValidation { .. } | Error::Config(_) => Some(
                "Review the configuration file and fix the invalid values."
            ),
            Error::CatalogParse { .. } => Some(
                "Check the persona catalog TOML. Each entry needs an [[personas]] table with id, department and keywords."
            ),
            Error::CatalogInvalid { .. } => Some(
                "Persona ids must be unique and every redirect_target must name a persona in the same catalog."
            ),
            Error::PersonaNotFound { .. } => Some(
                "Run 'switchboard personas' to list the available persona ids."
            ),
            Error::StorageCorrupted { .. } => Some(
                "The relationship data file could not be decoded. Move it aside to start from an empty store."
            ),
            Error::StorageWrite { .. } => Some(
                "Check that the storage data_dir exists and is writable."
            ),
            _ => None,
        }
    }

    /// Format the error for terminal display with colors
    pub fn format_for_terminal(&self) -> String {
        let code = self.code();

        let mut output = format!("\x1b[31mError [{}]\x1b[0m: {}\n", code.as_str(), self);

        if let Some(hint) = self.suggestion() {
            output.push_str(&format!("\n\x1b[33mHint\x1b[0m: {}\n", hint));
        }

        output
    }

    /// Format the error for logging (no colors)
    pub fn format_for_log(&self) -> String {
        format!("[{}] {}", self.code().as_str(), self)
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Error::ConfigNotFound { path: path.into() }
    }

    /// Create a config parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Error::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create a config validation error with field name
    pub fn config_field_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a catalog invariant error
    pub fn catalog_invalid(reason: impl Into<String>) -> Self {
        Error::CatalogInvalid {
            reason: reason.into(),
        }
    }

    /// Create a storage read error
    pub fn storage_read(message: impl Into<String>) -> Self {
        Error::StorageRead {
            message: message.into(),
        }
    }

    /// Create a storage write error
    pub fn storage_write(message: impl Into<String>) -> Self {
        Error::StorageWrite {
            message: message.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_format() {
        assert_eq!(ErrorCode::ConfigNotFound.as_str(), "E100");
        assert_eq!(ErrorCode::CatalogInvalid.as_str(), "E301");
        assert_eq!(ErrorCode::StorageConflict.as_str(), "E402");
        assert_eq!(ErrorCode::InternalError.as_str(), "E900");
    }

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(ErrorCode::ConfigNotFound.exit_code(), 10);
        assert_eq!(ErrorCode::IoRead.exit_code(), 20);
        assert_eq!(ErrorCode::PersonaNotFound.exit_code(), 30);
        assert_eq!(ErrorCode::StorageWrite.exit_code(), 40);
        assert_eq!(ErrorCode::InternalError.exit_code(), 90);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            Error::config_not_found("/test").code(),
            ErrorCode::ConfigNotFound
        );
        assert_eq!(
            Error::catalog_invalid("duplicate id").code(),
            ErrorCode::CatalogInvalid
        );
        assert_eq!(Error::storage_write("disk full").code(), ErrorCode::StorageWrite);
    }

    #[test]
    fn test_error_retryable() {
        let conflict = Error::StorageConflict {
            user_id: "u1".into(),
            persona_id: "ceo".into(),
        };
        assert!(conflict.is_retryable());
        assert!(!Error::storage_write("busy").is_retryable());
        assert!(!Error::storage_read("gone").is_retryable());
        assert!(!Error::catalog_invalid("bad").is_retryable());
    }

    #[test]
    fn test_error_suggestions() {
        let err = Error::config_not_found("/test");
        assert!(err.suggestion().unwrap().contains("config init"));

        let err = Error::PersonaNotFound { id: "cxo".into() };
        assert!(err.suggestion().unwrap().contains("switchboard personas"));

        assert!(Error::Internal("boom".into()).suggestion().is_none());
    }

    #[test]
    fn test_format_for_terminal() {
        let formatted = Error::config_not_found("/test/config.toml").format_for_terminal();

        assert!(formatted.contains("E100"));
        assert!(formatted.contains("\x1b[31m"));
        assert!(formatted.contains("Hint"));
    }

    #[test]
    fn test_format_for_log() {
        let formatted = Error::storage_read("timeout").format_for_log();

        assert!(formatted.contains("[E400]"));
        assert!(!formatted.contains("\x1b["));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();

        assert_eq!(err.code(), ErrorCode::IoNotFound);
    }
}
