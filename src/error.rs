//! Error types for modcache
//!
//! All modules use `ModcacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for modcache operations
pub type ModcacheResult<T> = Result<T, ModcacheError>;

/// All errors that can occur while acquiring a module source
#[derive(Error, Debug)]
pub enum ModcacheError {
    // Resolution errors
    #[error("Invalid module source '{source_ref}': {reason}")]
    Resolution { source_ref: String, reason: String },

    #[error("No fetch backend registered for protocol '{0}'")]
    UnsupportedProtocol(String),

    // Cache errors
    #[error("Failed to remove cached source at {path}: {source}")]
    CacheInvalidation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write source version marker {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Fetch errors
    #[error("Failed to download {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Failed to download {url}")]
    FetchIo {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Error downloading source: {source}")]
    FetchAborted {
        #[source]
        source: Box<ModcacheError>,
    },

    #[error("Hook '{name}' failed: {reason}")]
    Hook { name: String, reason: String },

    // Overlay errors
    #[error("Failed to copy {from} into {to}: {reason}")]
    Overlay {
        from: PathBuf,
        to: PathBuf,
        reason: String,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl ModcacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a resolution error for a source reference
    pub fn resolution(source_ref: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Resolution {
            source_ref: source_ref.into(),
            reason: reason.into(),
        }
    }

    /// Create a fetch error for a URL
    pub fn fetch(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create an overlay error
    pub fn overlay(from: impl Into<PathBuf>, to: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Overlay {
            from: from.into(),
            to: to.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a failure of the hook-wrapped download so the whole stage reads as a fetch failure
    pub fn fetch_aborted(source: ModcacheError) -> Self {
        match source {
            already @ Self::FetchAborted { .. } => already,
            other => Self::FetchAborted {
                source: Box::new(other),
            },
        }
    }

    /// Whether the error belongs to the fetch stage
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            Self::Fetch { .. }
                | Self::FetchIo { .. }
                | Self::FetchAborted { .. }
                | Self::UnsupportedProtocol(_)
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::CacheInvalidation { .. } => {
                Some("Check permissions on the download directory or remove it manually")
            }
            Self::Persist { .. } => {
                Some("The source was downloaded but not recorded; the next run will download it again")
            }
            Self::UnsupportedProtocol(_) => {
                Some("Supported protocols: file, git, http, https (force one with e.g. git::<url>)")
            }
            Self::FetchAborted { source } => source
                .hint()
                .or(Some("Re-run with --source-update to discard the cached copy")),
            Self::Fetch { .. } | Self::FetchIo { .. } => {
                Some("Re-run with --source-update to discard the cached copy")
            }
            _ => None,
        }
    }
}
