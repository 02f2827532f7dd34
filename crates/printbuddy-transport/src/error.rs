//! Transport error taxonomy.

use printbuddy_core::ErrorClass;
use std::io;
use thiserror::Error;

/// Errors recorded by the transport client.
///
/// The rendered message carries its class prefix, so the `Display` output
/// is what backends surface as the last-error text.
#[derive(Debug, Error)]
pub enum TransportError {
    /// TCP connect failed or timed out.
    #[error("SOCKET: Connection failed: {target}")]
    ConnectFailed {
        target: String,
        #[source]
        source: io::Error,
    },

    /// The request could not be written.
    #[error("SOCKET: Connection to {target} failed.")]
    WriteFailed {
        target: String,
        #[source]
        source: io::Error,
    },

    /// Reading the response failed, usually a read timeout.
    #[error("SOCKET: No response from {target}")]
    ReadFailed {
        target: String,
        #[source]
        source: io::Error,
    },

    /// Status line other than `200 OK` or `409 CONFLICT`.
    #[error("SOCKET: Response: {status}")]
    UnexpectedStatus { status: String },

    /// Header block was not terminated before the stream ended.
    #[error("SOCKET: Invalid response from {target}")]
    InvalidResponse { target: String },

    /// The body was not a valid JSON document.
    #[error("PARSER: Data Parsing failed: {server}")]
    Parse {
        server: String,
        #[source]
        source: serde_json::Error,
    },
}

impl TransportError {
    pub fn class(&self) -> ErrorClass {
        match self {
            TransportError::Parse { .. } => ErrorClass::Parser,
            _ => ErrorClass::Socket,
        }
    }
}
