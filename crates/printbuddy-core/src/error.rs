//! Error taxonomy shared by every PrintBuddy crate.

use std::fmt;
use thiserror::Error;

/// Class of a failure, rendered as the prefix of user-visible messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Connection refused, unexpected status, malformed response headers.
    Socket,
    /// JSON deserialization failure.
    Parser,
    /// Invalid per-printer configuration or unsupported backend id.
    Config,
    /// Settings file could not be opened, written or removed.
    File,
}

impl ErrorClass {
    /// Prefix used in messages, e.g. `SOCKET`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::Socket => "SOCKET",
            ErrorClass::Parser => "PARSER",
            ErrorClass::Config => "CONFIG",
            ErrorClass::File => "FILE",
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while reading or writing the settings files.
///
/// These never escape the public [`SettingsStore`](crate::SettingsStore)
/// operations; they are logged and the store continues with whatever
/// in-memory state exists.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A settings file could not be read.
    #[error("FILE: Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A settings file could not be written.
    #[error("FILE: File open failed for {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A settings file could not be removed.
    #[error("FILE: Failed to remove {path}: {source}")]
    Remove {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl SettingsError {
    pub fn class(&self) -> ErrorClass {
        ErrorClass::File
    }
}
