//! Lock file persistence and merging
//!
//! The lock file is the durable record of every dependency and its
//! verified hash. It is written as sorted, indented JSON so that
//! re-running the tool produces minimal diffs.
//!
//! There is no file locking: two invocations racing on the same lock
//! file will each overwrite the other's result.

use super::dependency::Dependency;
use crate::error::{Cmake2NixError, Cmake2NixResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Current lock file format
pub const LOCK_FORMAT_VERSION: &str = "1.0";

/// The full set of locked dependencies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockFile {
    /// Format tag for forward compatibility
    #[serde(default = "format_version")]
    pub version: String,

    /// Dependencies keyed (and therefore sorted) by name
    #[serde(default)]
    pub dependencies: BTreeMap<String, Dependency>,
}

fn format_version() -> String {
    LOCK_FORMAT_VERSION.to_string()
}

impl Default for LockFile {
    fn default() -> Self {
        Self {
            version: format_version(),
            dependencies: BTreeMap::new(),
        }
    }
}

/// What a merge did, by dependency name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Names not previously locked
    pub added: Vec<String>,
    /// Names whose entry was replaced (version bump, fetcher change, or a
    /// hashed record superseding the old one)
    pub replaced: Vec<String>,
    /// Names whose existing entry was kept as-is
    pub kept: Vec<String>,
}

impl MergeSummary {
    pub fn changed(&self) -> bool {
        !self.added.is_empty() || !self.replaced.is_empty()
    }
}

impl LockFile {
    /// Build a lock file from freshly discovered dependencies
    pub fn from_dependencies(deps: impl IntoIterator<Item = Dependency>) -> Self {
        let mut lock = Self::default();
        for dep in deps {
            lock.insert(dep);
        }
        lock
    }

    /// Insert or replace a dependency by name
    pub fn insert(&mut self, dep: Dependency) -> Option<Dependency> {
        self.dependencies.insert(dep.name.clone(), dep)
    }

    pub fn get(&self, name: &str) -> Option<&Dependency> {
        self.dependencies.get(name)
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Number of dependencies carrying a verified hash
    pub fn verified_count(&self) -> usize {
        self.dependencies
            .values()
            .filter(|d| d.has_verified_hash())
            .count()
    }

    /// Names of dependencies still waiting for a hash
    pub fn pending(&self) -> Vec<&str> {
        self.dependencies
            .values()
            .filter(|d| !d.has_verified_hash())
            .map(|d| d.name.as_str())
            .collect()
    }

    /// Merge newly discovered dependencies into this lock file.
    ///
    /// Per incoming dependency:
    /// - unknown name: added
    /// - same version and fetcher: the existing entry is kept, unless the
    ///   incoming one carries a verified hash, which then replaces it
    /// - different version or fetcher: replaced wholesale, dropping the
    ///   old hash
    ///
    /// A verified hash is never overwritten by a placeholder. Entries not
    /// mentioned by `incoming` are retained.
    pub fn merge(&self, incoming: impl IntoIterator<Item = Dependency>) -> (Self, MergeSummary) {
        let mut merged = self.clone();
        let mut summary = MergeSummary::default();

        for dep in incoming {
            match merged.dependencies.get(&dep.name) {
                None => {
                    debug!("merge: adding {}", dep.name);
                    summary.added.push(dep.name.clone());
                }
                Some(existing)
                    if existing.version == dep.version
                        && existing.source.method() == dep.source.method() =>
                {
                    if !dep.has_verified_hash() {
                        debug!("merge: keeping {} {}", dep.name, existing.version);
                        summary.kept.push(dep.name.clone());
                        continue;
                    }
                    debug!("merge: {} supplied with a hash, replacing", dep.name);
                    summary.replaced.push(dep.name.clone());
                }
                Some(existing) => {
                    debug!(
                        "merge: {} changed {} {} -> {} {}",
                        dep.name,
                        existing.source.method(),
                        existing.version,
                        dep.source.method(),
                        dep.version
                    );
                    summary.replaced.push(dep.name.clone());
                }
            }
            merged.insert(dep);
        }

        (merged, summary)
    }

    /// Parse lock file content. `path` is used for error messages only.
    pub fn parse(content: &str, path: &Path) -> Cmake2NixResult<Self> {
        Self::parse_bytes(content.as_bytes(), path)
    }

    /// Parse raw lock file bytes; invalid UTF-8 is corruption like any
    /// other malformed content
    pub fn parse_bytes(content: &[u8], path: &Path) -> Cmake2NixResult<Self> {
        let mut lock: LockFile =
            serde_json::from_slice(content).map_err(|e| Cmake2NixError::LockCorrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        // The map key is authoritative when an entry omits its name
        for (key, dep) in lock.dependencies.iter_mut() {
            if dep.name.is_empty() {
                dep.name = key.clone();
            }
        }

        Ok(lock)
    }

    /// Render as the on-disk format: two-space indented JSON with a
    /// trailing newline
    pub fn to_json_string(&self) -> Cmake2NixResult<String> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }

    /// Load a lock file from disk
    pub async fn load(path: &Path) -> Cmake2NixResult<Self> {
        if !path.exists() {
            return Err(Cmake2NixError::LockNotFound(path.to_path_buf()));
        }

        let content = fs::read(path)
            .await
            .map_err(|e| Cmake2NixError::io(format!("reading lock file {}", path.display()), e))?;

        let lock = Self::parse_bytes(&content, path)?;
        debug!(
            "Loaded {} dependencies from {}",
            lock.len(),
            path.display()
        );
        Ok(lock)
    }

    /// Load a lock file, or start an empty one if none exists yet
    pub async fn load_or_default(path: &Path) -> Cmake2NixResult<Self> {
        match Self::load(path).await {
            Err(Cmake2NixError::LockNotFound(_)) => {
                debug!("No lock file at {}, starting fresh", path.display());
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Save the lock file, replacing any previous version atomically.
    ///
    /// The content goes to a sibling temp file which is synced and then
    /// renamed over `path`, so readers see either the old or the new file.
    pub async fn save(&self, path: &Path) -> Cmake2NixResult<()> {
        let content = self.to_json_string()?;
        let write_err = |source| Cmake2NixError::LockWrite {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(write_err)?;
            }
        }

        let tmp_path = tmp_write_path(path);
        if let Err(e) = write_synced(&tmp_path, content.as_bytes()).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(write_err(e));
        }

        if let Err(e) = fs::rename(&tmp_path, path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(write_err(e));
        }
        sync_parent_dir(path).await.map_err(write_err)?;

        info!("Lock file saved: {}", path.display());
        Ok(())
    }
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await
}

/// Flush the directory entry so the rename survives a crash
#[cfg(unix)]
async fn sync_parent_dir(path: &Path) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::File::open(parent).await?.sync_all().await
}

#[cfg(not(unix))]
async fn sync_parent_dir(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

fn tmp_write_path(path: &Path) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut tmp: OsString = path.as_os_str().to_os_string();
    tmp.push(format!(".tmp.{}.{}", std::process::id(), unique));
    PathBuf::from(tmp)
}
