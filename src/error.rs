//! Error types for p4tagged
//!
//! Provides a unified error type for all operations. Server-reported
//! failures arrive here already classified: a [`ServerMessage`] that carries
//! an authentication failure becomes [`P4Error::Access`], any other failure
//! becomes [`P4Error::Request`]. Transport failures are produced upstream and
//! travel through unchanged as [`P4Error::Connection`].

use std::fmt;

use thiserror::Error;

use crate::classify::AuthFailureKind;
use crate::protocol::ServerMessage;

/// Result type alias using P4Error
pub type Result<T> = std::result::Result<T, P4Error>;

/// Unified error type for p4tagged operations
#[derive(Debug, Error)]
pub enum P4Error {
    // -------------------------------------------------------------------------
    // Classified Server Errors
    // -------------------------------------------------------------------------
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Access error ({kind}): {message}")]
    Access {
        kind: AuthFailureKind,
        message: ServerMessage,
    },

    #[error("Request error: {0}")]
    Request(ServerMessage),

    // -------------------------------------------------------------------------
    // Caller Errors
    // -------------------------------------------------------------------------
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Capture Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl P4Error {
    /// Classified kind of this error, if it came from the server or transport
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            P4Error::Connection(_) => Some(ErrorKind::Connection),
            P4Error::Access { kind, .. } => Some(ErrorKind::Access(*kind)),
            P4Error::Request(_) => Some(ErrorKind::Request),
            _ => None,
        }
    }

    /// The server message behind an access or request error
    pub fn server_message(&self) -> Option<&ServerMessage> {
        match self {
            P4Error::Access { message, .. } | P4Error::Request(message) => Some(message),
            _ => None,
        }
    }

    /// Authentication failure kind, for access errors only
    pub fn auth_failure(&self) -> Option<AuthFailureKind> {
        match self {
            P4Error::Access { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Terminal error kinds a command can end in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Transport unreachable or broken
    Connection,

    /// Server refused access; carries the re-authentication hint
    Access(AuthFailureKind),

    /// Any other server-reported failure
    Request,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Connection => f.write_str("connection"),
            ErrorKind::Access(kind) => write!(f, "access ({})", kind),
            ErrorKind::Request => f.write_str("request"),
        }
    }
}

/// Failure raised by the transport before any row is produced
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ConnectionError {
    message: String,

    #[source]
    source: Option<std::io::Error>,
}

impl ConnectionError {
    /// Create a connection error with a description
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection error wrapping the underlying I/O failure
    pub fn with_source(message: impl Into<String>, source: std::io::Error) -> Self {
        Self {
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
