//! Dependency records
//!
//! A dependency is identified by name and carries the Nix fetcher that
//! reproduces its source tree. The fetcher is a closed set of variants,
//! each owning the argument keys it needs. Everything else a lock file
//! records for a dependency (extra fetcher args, discovery metadata) is
//! carried through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Sentinel written in place of an integrity hash that is not known yet.
///
/// Its presence is the only signal that a dependency still needs
/// prefetching.
pub const PLACEHOLDER_HASH: &str = "sha256-AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

/// Version recorded when discovery could not determine one
pub const UNKNOWN_VERSION: &str = "unknown";

/// Revision used when discovery recorded no tag
pub const DEFAULT_REV: &str = "HEAD";

pub const METHOD_GITHUB: &str = "fetchFromGitHub";
pub const METHOD_GIT: &str = "fetchgit";
pub const METHOD_URL: &str = "fetchurl";

/// Where a dependency's source comes from, and how Nix fetches it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// `fetchFromGitHub { owner, repo, rev, hash }`
    GitHub {
        owner: String,
        repo: String,
        rev: String,
        hash: String,
    },
    /// `fetchgit { url, rev, sha256 }`
    Git {
        url: String,
        rev: String,
        sha256: String,
    },
    /// `fetchurl { url, sha256 }`
    Url { url: String, sha256: String },
    /// A fetcher this tool has no provider for, or none at all (empty method).
    /// Its arguments live in [`Dependency::extra_args`].
    Other { method: String },
}

impl Source {
    /// Nix fetcher name as written to the lock file
    pub fn method(&self) -> &str {
        match self {
            Self::GitHub { .. } => METHOD_GITHUB,
            Self::Git { .. } => METHOD_GIT,
            Self::Url { .. } => METHOD_URL,
            Self::Other { method } => method.as_str(),
        }
    }

    /// The argument key holding the integrity hash for this fetcher
    pub fn hash_key(&self) -> Option<&'static str> {
        match self {
            Self::GitHub { .. } => Some("hash"),
            Self::Git { .. } | Self::Url { .. } => Some("sha256"),
            Self::Other { .. } => None,
        }
    }

    /// Current integrity hash (possibly the placeholder)
    pub fn hash(&self) -> Option<&str> {
        match self {
            Self::GitHub { hash, .. } => Some(hash.as_str()),
            Self::Git { sha256, .. } | Self::Url { sha256, .. } => Some(sha256.as_str()),
            Self::Other { .. } => None,
        }
    }

    /// Overwrite the integrity hash. Returns the key written, or `None`
    /// when the fetcher has no hash slot.
    pub fn set_hash(&mut self, value: String) -> Option<&'static str> {
        match self {
            Self::GitHub { hash, .. } => *hash = value,
            Self::Git { sha256, .. } | Self::Url { sha256, .. } => *sha256 = value,
            Self::Other { .. } => return None,
        }
        self.hash_key()
    }

    /// Classify the current hash
    pub fn hash_state(&self) -> HashState {
        match self.hash() {
            None => HashState::Unsupported,
            Some(h) if h.is_empty() || h == PLACEHOLDER_HASH => HashState::Placeholder,
            Some(_) => HashState::Verified,
        }
    }

    /// Rebuild a source from a lock file `method` and its args, taking the
    /// keys the variant owns out of `args`. A known method missing its
    /// locator degrades to `Other` so nothing is lost.
    fn from_args(method: &str, args: &mut Map<String, Value>) -> Self {
        match method {
            METHOD_GITHUB if has_str(args, "owner") && has_str(args, "repo") => Self::GitHub {
                owner: take_str(args, "owner").unwrap_or_default(),
                repo: take_str(args, "repo").unwrap_or_default(),
                rev: take_str(args, "rev").unwrap_or_else(|| DEFAULT_REV.to_string()),
                hash: take_str(args, "hash").unwrap_or_else(|| PLACEHOLDER_HASH.to_string()),
            },
            METHOD_GIT if has_str(args, "url") => Self::Git {
                url: take_str(args, "url").unwrap_or_default(),
                rev: take_str(args, "rev").unwrap_or_else(|| DEFAULT_REV.to_string()),
                sha256: take_str(args, "sha256").unwrap_or_else(|| PLACEHOLDER_HASH.to_string()),
            },
            METHOD_URL if has_str(args, "url") => Self::Url {
                url: take_str(args, "url").unwrap_or_default(),
                sha256: take_str(args, "sha256").unwrap_or_else(|| PLACEHOLDER_HASH.to_string()),
            },
            other => Self::Other {
                method: other.to_string(),
            },
        }
    }

    /// Write the keys this variant owns into `args`
    fn write_args(&self, args: &mut Map<String, Value>) {
        let mut put = |k: &str, v: &str| {
            args.insert(k.to_string(), Value::String(v.to_string()));
        };
        match self {
            Self::GitHub {
                owner,
                repo,
                rev,
                hash,
            } => {
                put("owner", owner);
                put("repo", repo);
                put("rev", rev);
                put("hash", hash);
            }
            Self::Git { url, rev, sha256 } => {
                put("url", url);
                put("rev", rev);
                put("sha256", sha256);
            }
            Self::Url { url, sha256 } => {
                put("url", url);
                put("sha256", sha256);
            }
            Self::Other { .. } => {}
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GitHub {
                owner, repo, rev, ..
            } => write!(f, "github:{}/{}@{}", owner, repo, rev),
            Self::Git { url, rev, .. } => write!(f, "git+{}@{}", url, rev),
            Self::Url { url, .. } => write!(f, "{}", url),
            Self::Other { method } if method.is_empty() => write!(f, "(no fetcher)"),
            Self::Other { method } => write!(f, "{} (unsupported)", method),
        }
    }
}

/// Whether a dependency's integrity hash can be trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashState {
    /// A real hash produced by a prefetch tool (or supplied by hand)
    Verified,
    /// Still the placeholder; needs prefetching
    Placeholder,
    /// The fetcher has no hash slot this tool knows how to fill
    Unsupported,
}

impl fmt::Display for HashState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Verified => "verified",
            Self::Placeholder => "placeholder",
            Self::Unsupported => "n/a",
        };
        write!(f, "{}", name)
    }
}

/// One locked dependency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "LockEntry", into = "LockEntry")]
pub struct Dependency {
    /// Primary key within a lock file
    pub name: String,

    /// Free-form version, `"unknown"` when discovery could not tell
    pub version: String,

    /// Fetcher and its owned arguments
    pub source: Source,

    /// Fetcher arguments not owned by `source`, written back verbatim
    pub extra_args: Map<String, Value>,

    /// Raw discovery record, opaque to locking and prefetching
    pub metadata: Value,
}

impl Dependency {
    /// Create a dependency with no metadata
    pub fn new(name: impl Into<String>, version: impl Into<String>, source: Source) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            source,
            extra_args: Map::new(),
            metadata: Value::Object(Map::new()),
        }
    }

    /// A `fetchFromGitHub` dependency with a placeholder hash
    pub fn github(
        name: impl Into<String>,
        version: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        rev: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            version,
            Source::GitHub {
                owner: owner.into(),
                repo: repo.into(),
                rev: rev.into(),
                hash: PLACEHOLDER_HASH.to_string(),
            },
        )
    }

    /// A `fetchgit` dependency with a placeholder hash
    pub fn git(
        name: impl Into<String>,
        version: impl Into<String>,
        url: impl Into<String>,
        rev: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            version,
            Source::Git {
                url: url.into(),
                rev: rev.into(),
                sha256: PLACEHOLDER_HASH.to_string(),
            },
        )
    }

    /// A `fetchurl` dependency with a placeholder hash
    pub fn url(
        name: impl Into<String>,
        version: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            version,
            Source::Url {
                url: url.into(),
                sha256: PLACEHOLDER_HASH.to_string(),
            },
        )
    }

    /// Attach discovery metadata
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Set the integrity hash (builder form, mostly for fixtures)
    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.source.set_hash(hash.into());
        self
    }

    pub fn hash_state(&self) -> HashState {
        self.source.hash_state()
    }

    /// True when the hash is anything other than empty or the placeholder
    pub fn has_verified_hash(&self) -> bool {
        self.hash_state() == HashState::Verified
    }

    /// Fetcher args exactly as they appear in the lock file
    pub fn args(&self) -> Map<String, Value> {
        let mut args = self.extra_args.clone();
        self.source.write_args(&mut args);
        args
    }
}

/// On-disk shape of a dependency. Every field is optional when reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LockEntry {
    #[serde(default)]
    name: String,

    #[serde(default = "unknown_version")]
    version: String,

    #[serde(default)]
    method: String,

    #[serde(default)]
    args: Map<String, Value>,

    #[serde(default = "empty_object")]
    metadata: Value,
}

fn unknown_version() -> String {
    UNKNOWN_VERSION.to_string()
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

impl From<LockEntry> for Dependency {
    fn from(entry: LockEntry) -> Self {
        let mut args = entry.args;
        let source = Source::from_args(&entry.method, &mut args);
        Self {
            name: entry.name,
            version: entry.version,
            source,
            extra_args: args,
            metadata: entry.metadata,
        }
    }
}

impl From<Dependency> for LockEntry {
    fn from(dep: Dependency) -> Self {
        let args = dep.args();
        Self {
            name: dep.name,
            version: dep.version,
            method: dep.source.method().to_string(),
            args,
            metadata: dep.metadata,
        }
    }
}

fn has_str(args: &Map<String, Value>, key: &str) -> bool {
    args.get(key).is_some_and(Value::is_string)
}

/// Remove `key` from `args` if it holds a string. Non-string values stay put.
fn take_str(args: &mut Map<String, Value>, key: &str) -> Option<String> {
    if !has_str(args, key) {
        return None;
    }
    match args.remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn github_constructor_uses_placeholder() {
        let dep = Dependency::github("fmt", "10.2.1", "fmtlib", "fmt", "10.2.1");
        assert_eq!(dep.source.method(), "fetchFromGitHub");
        assert_eq!(dep.source.hash(), Some(PLACEHOLDER_HASH));
        assert_eq!(dep.hash_state(), HashState::Placeholder);
        assert!(!dep.has_verified_hash());
    }

    #[test]
    fn set_hash_writes_method_key() {
        let mut gh = Dependency::github("a", "1", "o", "r", "HEAD");
        assert_eq!(gh.source.set_hash("sha256-xyz".into()), Some("hash"));
        assert_eq!(gh.args()["hash"], "sha256-xyz");

        let mut git = Dependency::git("b", "1", "https://example.com/b.git", "v1");
        assert_eq!(git.source.set_hash("sha256-abc".into()), Some("sha256"));
        assert_eq!(git.args()["sha256"], "sha256-abc");
        assert!(git.has_verified_hash());

        let mut other = Dependency::new("c", "1", Source::Other { method: "fetchsvn".into() });
        assert_eq!(other.source.set_hash("sha256-abc".into()), None);
        assert_eq!(other.hash_state(), HashState::Unsupported);
    }

    #[test]
    fn empty_hash_is_not_verified() {
        let dep = Dependency::url("z", "1", "https://example.com/z.tar.gz").with_hash("");
        assert_eq!(dep.hash_state(), HashState::Placeholder);
    }

    #[test]
    fn serializes_method_and_args() {
        let dep = Dependency::github("widget", "2.0", "acme", "widget", "v2.0")
            .with_metadata(json!({"gitTag": "v2.0"}));
        let value = serde_json::to_value(&dep).unwrap();

        assert_eq!(
            value,
            json!({
                "name": "widget",
                "version": "2.0",
                "method": "fetchFromGitHub",
                "args": {
                    "owner": "acme",
                    "repo": "widget",
                    "rev": "v2.0",
                    "hash": PLACEHOLDER_HASH,
                },
                "metadata": {"gitTag": "v2.0"},
            })
        );
    }

    #[test]
    fn missing_fields_take_defaults() {
        let dep: Dependency = serde_json::from_value(json!({
            "method": "fetchgit",
            "args": {"url": "https://example.com/x.git"}
        }))
        .unwrap();

        assert_eq!(dep.name, "");
        assert_eq!(dep.version, UNKNOWN_VERSION);
        assert_eq!(
            dep.source,
            Source::Git {
                url: "https://example.com/x.git".into(),
                rev: DEFAULT_REV.into(),
                sha256: PLACEHOLDER_HASH.into(),
            }
        );
        assert_eq!(dep.metadata, json!({}));
    }

    #[test]
    fn extra_args_survive() {
        let raw = json!({
            "name": "grpc",
            "version": "1.60.0",
            "method": "fetchFromGitHub",
            "args": {
                "owner": "grpc",
                "repo": "grpc",
                "rev": "v1.60.0",
                "hash": "sha256-real",
                "fetchSubmodules": true
            },
            "metadata": {}
        });
        let dep: Dependency = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(dep.extra_args["fetchSubmodules"], json!(true));
        assert_eq!(serde_json::to_value(&dep).unwrap(), raw);
    }

    #[test]
    fn unknown_method_is_kept_verbatim() {
        let raw = json!({
            "name": "legacy",
            "version": "3",
            "method": "fetchsvn",
            "args": {"url": "svn://example.com/legacy", "rev": "1234"},
            "metadata": {"note": "x"}
        });
        let dep: Dependency = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(dep.source, Source::Other { method: "fetchsvn".into() });
        assert_eq!(serde_json::to_value(&dep).unwrap(), raw);
    }

    #[test]
    fn github_without_owner_degrades_to_other() {
        let dep: Dependency = serde_json::from_value(json!({
            "name": "broken",
            "method": "fetchFromGitHub",
            "args": {"repo": "broken"}
        }))
        .unwrap();
        assert_eq!(dep.source, Source::Other { method: "fetchFromGitHub".into() });
        assert_eq!(dep.extra_args["repo"], "broken");
    }

    #[test]
    fn source_display() {
        let dep = Dependency::github("w", "1", "acme", "widget", "v2.0");
        assert_eq!(dep.source.to_string(), "github:acme/widget@v2.0");
        let other = Source::Other { method: String::new() };
        assert_eq!(other.to_string(), "(no fetcher)");
    }
}
