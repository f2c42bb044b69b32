//! Configuration schema for cmake2nix
//!
//! Global configuration lives at `~/.config/cmake2nix/config.toml`; a
//! project may override any of it with a `cmake2nix.toml` next to its
//! `CMakeLists.txt`.

use crate::prefetch::DEFAULT_JOBS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Lock file settings
    pub lock: LockConfig,

    /// Discovery log settings
    pub discovery: DiscoveryConfig,

    /// Hash prefetching settings
    pub prefetch: PrefetchConfig,

    /// Directory of the project-local config, if one was found. Relative
    /// paths in the config resolve against it.
    #[serde(skip)]
    pub project_root: Option<PathBuf>,
}

impl Config {
    /// Resolve a configured path against the project root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.project_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Where the lock file lives
    pub fn lock_path(&self) -> PathBuf {
        self.resolve(&self.lock.path)
    }

    /// Where the discovery log is read from by default
    pub fn discovery_log_path(&self) -> PathBuf {
        self.resolve(&self.discovery.log)
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Lock file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Lock file location
    pub path: PathBuf,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("cmake-lock.json"),
        }
    }
}

/// Discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Discovery log file, or the discovery derivation output containing it
    pub log: PathBuf,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            log: PathBuf::from(crate::discovery::DISCOVERY_LOG_NAME),
        }
    }
}

/// Prefetch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefetchConfig {
    /// Concurrent prefetch tool invocations
    pub jobs: usize,

    /// Per-invocation timeout in seconds
    pub timeout_secs: u64,

    /// Tool used for fetchFromGitHub sources
    pub github_tool: String,

    /// Tool used for fetchgit sources
    pub git_tool: String,

    /// Tool used for fetchurl sources
    pub url_tool: String,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            jobs: DEFAULT_JOBS,
            timeout_secs: 300,
            github_tool: "nix-prefetch-github".to_string(),
            git_tool: "nix-prefetch-git".to_string(),
            url_tool: "nix-prefetch-url".to_string(),
        }
    }
}
