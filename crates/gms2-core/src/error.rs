//! Error types for GMS2 project access

use std::path::PathBuf;
use thiserror::Error;

/// Result type for GMS2 operations
pub type Result<T> = std::result::Result<T, Gms2Error>;

/// GMS2 error types
#[derive(Debug, Error)]
pub enum Gms2Error {
    /// Root path, descriptor file, or named asset absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Descriptor unreadable even after the lenient pass
    #[error("Parse error in {}: {message}", path.display())]
    ParseError { path: PathBuf, message: String },

    /// Requested path escapes the project root
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Duplicate asset name within a category
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Filesystem failure outside a single descriptor read
    #[error("I/O error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Protocol error
    #[error("Protocol error: {0}")]
    ProtocolError(String),
}

impl Gms2Error {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Stable kind tag reported to callers alongside the message
    pub fn kind(&self) -> &'static str {
        match self {
            Gms2Error::NotFound(_) => "NotFound",
            Gms2Error::ParseError { .. } => "ParseError",
            Gms2Error::InvalidPath(_) => "InvalidPath",
            Gms2Error::Conflict(_) => "Conflict",
            Gms2Error::Io { .. } => "Io",
            Gms2Error::SerializationError(_) => "SerializationError",
            Gms2Error::ProtocolError(_) => "ProtocolError",
        }
    }
}

impl From<serde_json::Error> for Gms2Error {
    fn from(err: serde_json::Error) -> Self {
        Gms2Error::SerializationError(err.to_string())
    }
}

/// JSON-RPC error codes for GMS2 tools
pub mod error_codes {
    pub const NOT_FOUND: i32 = -32000;
    pub const PARSE_ERROR: i32 = -32001;
    pub const INVALID_PATH: i32 = -32002;
    pub const CONFLICT: i32 = -32003;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}
