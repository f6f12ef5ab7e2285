//! ReQL wire protocol error types.

use std::fmt;
use std::io;

/// Result type for wire protocol operations.
pub type WireResult<T> = Result<T, WireError>;

/// ReQL wire protocol errors.
#[derive(Debug)]
pub enum WireError {
    /// I/O error
    Io(io::Error),

    /// JSON payload could not be decoded or encoded
    Json(serde_json::Error),

    /// Handshake failed (server status string was not "SUCCESS")
    Handshake(String),

    /// Frame body exceeds the configured limit
    FrameTooLarge { size: usize, max: usize },

    /// Socket receive exceeded the configured timeout
    Timeout,

    /// Connection closed by the peer
    ConnectionClosed,
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireError::Io(e) => write!(f, "I/O error: {}", e),
            WireError::Json(e) => write!(f, "JSON error: {}", e),
            WireError::Handshake(status) => {
                write!(f, "Server dropped connection with message: '{}'", status)
            }
            WireError::FrameTooLarge { size, max } => {
                write!(f, "Frame too large: {} bytes (max: {})", size, max)
            }
            WireError::Timeout => write!(f, "Socket receive timed out"),
            WireError::ConnectionClosed => write!(f, "Connection closed"),
        }
    }
}

impl std::error::Error for WireError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WireError::Io(e) => Some(e),
            WireError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for WireError {
    fn from(err: io::Error) -> Self {
        WireError::Io(err)
    }
}

impl From<serde_json::Error> for WireError {
    fn from(err: serde_json::Error) -> Self {
        WireError::Json(err)
    }
}
