//! DC-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, DcError>;

/// Top-level error type for depclean.
///
/// Per-entry traversal failures never surface here: the walker swallows them
/// and keeps going. Only configuration, root validation, logging setup and
/// deletion produce a `DcError`.
#[derive(Debug, Error)]
pub enum DcError {
    #[error("[DC-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[DC-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[DC-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[DC-2001] invalid scan root {path}: {reason}")]
    InvalidRoot { path: PathBuf, reason: String },

    #[error("[DC-3001] permission denied for {path}")]
    PermissionDenied { path: PathBuf },

    #[error("[DC-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[DC-3003] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[DC-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl DcError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "DC-1001",
            Self::MissingConfig { .. } => "DC-1002",
            Self::ConfigParse { .. } => "DC-1003",
            Self::InvalidRoot { .. } => "DC-2001",
            Self::PermissionDenied { .. } => "DC-3001",
            Self::Io { .. } => "DC-3002",
            Self::Serialization { .. } => "DC-3003",
            Self::Runtime { .. } => "DC-3900",
        }
    }

    /// Whether retrying might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Runtime { .. })
    }

    /// Convenience constructor for IO errors with a known path.
    ///
    /// `PermissionDenied` IO errors are mapped to the dedicated variant so
    /// deletion reports can tell them apart.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            return Self::PermissionDenied {
                path: path.as_ref().to_path_buf(),
            };
        }
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for DcError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for DcError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
