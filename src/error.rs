//! Error types for cmake2nix
//!
//! All modules use `Cmake2NixResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cmake2nix operations
pub type Cmake2NixResult<T> = Result<T, Cmake2NixError>;

/// All errors that can occur in cmake2nix
#[derive(Error, Debug)]
pub enum Cmake2NixError {
    // Lock file errors
    #[error("Lock file not found: {0}")]
    LockNotFound(PathBuf),

    #[error("Lock file {path} is corrupt: {reason}")]
    LockCorrupt { path: PathBuf, reason: String },

    #[error("Failed to write lock file {path}: {source}")]
    LockWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Discovery errors
    #[error("Discovery log not found: {0}")]
    DiscoveryLogNotFound(PathBuf),

    // Prefetch errors
    #[error("{tool}: {reason}")]
    HashExtraction {
        tool: String,
        reason: String,
        /// Captured tool output, kept for diagnostics
        output: String,
    },

    #[error("Prefetch incomplete: {verified}/{total} dependencies have verified hashes")]
    PrefetchIncomplete { verified: usize, total: usize },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

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

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("{0}")]
    User(String),
}

impl Cmake2NixError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a hash extraction error carrying the tool's captured output
    pub fn hash_extraction(
        tool: impl Into<String>,
        reason: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self::HashExtraction {
            tool: tool.into(),
            reason: reason.into(),
            output: output.into(),
        }
    }

    /// Captured tool output, if this error came from a prefetch tool
    pub fn tool_output(&self) -> Option<&str> {
        match self {
            Self::HashExtraction { output, .. } if !output.is_empty() => Some(output),
            _ => None,
        }
    }

    /// Check if re-running the command may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::HashExtraction { .. } | Self::PrefetchIncomplete { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::LockNotFound(_) => Some("Run: cmake2nix discover"),
            Self::LockCorrupt { .. } => {
                Some("Fix the JSON by hand or delete it and run: cmake2nix lock")
            }
            Self::DiscoveryLogNotFound(_) => {
                Some("Build the discovery derivation first, then pass its output with --log")
            }
            Self::PrefetchIncomplete { .. } => Some("Re-run: cmake2nix prefetch"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Cmake2NixError::LockNotFound(PathBuf::from("cmake-lock.json"));
        assert!(err.to_string().contains("Lock file not found"));
    }

    #[test]
    fn error_hint() {
        let err = Cmake2NixError::LockNotFound(PathBuf::from("cmake-lock.json"));
        assert_eq!(err.hint(), Some("Run: cmake2nix discover"));
    }

    #[test]
    fn error_retryable() {
        let err = Cmake2NixError::hash_extraction("nix-prefetch-url", "exit status 1", "boom");
        assert!(err.is_retryable());
        assert!(!Cmake2NixError::User("x".into()).is_retryable());
    }

    #[test]
    fn hash_extraction_keeps_output() {
        let err = Cmake2NixError::hash_extraction("nix-prefetch-git", "no hash", "fatal: repo");
        assert_eq!(err.tool_output(), Some("fatal: repo"));
        assert_eq!(err.to_string(), "nix-prefetch-git: no hash");

        let err = Cmake2NixError::hash_extraction("nix-prefetch-git", "no hash", "");
        assert_eq!(err.tool_output(), None);
    }
}
