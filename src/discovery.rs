//! Discovery log ingestion
//!
//! The discovery derivation runs CMake with a dependency provider that logs
//! one JSON object per `FetchContent`/`find_package` call. This module turns
//! that log into [`Dependency`] records, choosing a Nix fetcher from the
//! recorded repository and stamping placeholder hashes.
//!
//! The log is best-effort: a line that fails to parse is reported and
//! skipped, never fatal to the batch.

use crate::error::{Cmake2NixError, Cmake2NixResult};
use crate::lock::{Dependency, Source, DEFAULT_REV, PLACEHOLDER_HASH, UNKNOWN_VERSION};
use regex::Regex;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tokio::fs;
use tracing::{debug, info, warn};

/// File name of the log inside the discovery derivation's output
pub const DISCOVERY_LOG_NAME: &str = "discovery-log.json";

/// A log line that produced no dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number
    pub line: usize,
    pub reason: String,
}

/// Result of parsing a discovery log
#[derive(Debug, Clone, Default)]
pub struct Discovered {
    pub dependencies: Vec<Dependency>,
    pub skipped: Vec<SkippedLine>,
}

fn github_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:https?://)?(?:www\.)?github\.com/([^/\s]+)/([^/\s#?]+?)(?:\.git)?(?:[/#?].*)?$")
            .expect("github url regex must compile")
    })
}

/// Pick a fetcher for a git repository URL.
///
/// GitHub URLs become `fetchFromGitHub` (tarball fetch, cheaper than a
/// clone); anything else is fetched with `fetchgit`.
pub fn classify_repository(url: &str, rev: Option<&str>) -> Source {
    let rev = rev.unwrap_or(DEFAULT_REV).to_string();
    if let Some(caps) = github_re().captures(url.trim()) {
        return Source::GitHub {
            owner: caps[1].to_string(),
            repo: caps[2].to_string(),
            rev,
            hash: PLACEHOLDER_HASH.to_string(),
        };
    }
    Source::Git {
        url: url.to_string(),
        rev,
        sha256: PLACEHOLDER_HASH.to_string(),
    }
}

/// Convert one parsed discovery record into a dependency
fn dependency_from_record(record: Value) -> Result<Dependency, String> {
    if !record.is_object() {
        return Err("record is not a JSON object".to_string());
    }

    let name = str_field(&record, "name")
        .filter(|n| !n.is_empty())
        .ok_or_else(|| "record has no name".to_string())?
        .to_string();
    let version = str_field(&record, "version")
        .unwrap_or(UNKNOWN_VERSION)
        .to_string();

    let source = if let Some(repo) = str_field(&record, "gitRepository") {
        classify_repository(repo, str_field(&record, "gitTag"))
    } else if let Some(url) = str_field(&record, "url") {
        Source::Url {
            url: url.to_string(),
            sha256: PLACEHOLDER_HASH.to_string(),
        }
    } else {
        debug!("{} has no recorded source location", name);
        Source::Other {
            method: String::new(),
        }
    };

    Ok(Dependency::new(name, version, source).with_metadata(record))
}

fn str_field<'a>(record: &'a Value, key: &str) -> Option<&'a str> {
    record.get(key).and_then(Value::as_str)
}

/// Parse discovery log lines into dependencies.
///
/// Blank lines are ignored. Lines that are not JSON objects, or records
/// without a name, are skipped and reported in [`Discovered::skipped`].
pub fn parse_discovery_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Discovered {
    collect_records(lines.into_iter().map(Ok))
}

/// Parse a raw discovery log. A line that is not valid UTF-8 is skipped
/// like any other malformed line.
pub fn parse_discovery_bytes(content: &[u8]) -> Discovered {
    collect_records(
        content
            .split(|b| *b == b'\n')
            .map(|line| std::str::from_utf8(line).map_err(|e| format!("invalid UTF-8: {}", e))),
    )
}

fn collect_records<'a>(lines: impl Iterator<Item = Result<&'a str, String>>) -> Discovered {
    let mut discovered = Discovered::default();

    for (idx, line) in lines.enumerate() {
        let line_no = idx + 1;
        let parsed = match line {
            Ok(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    continue;
                }
                serde_json::from_str::<Value>(trimmed)
                    .map_err(|e| format!("invalid JSON: {}", e))
                    .and_then(dependency_from_record)
            }
            Err(reason) => Err(reason),
        };

        match parsed {
            Ok(dep) => {
                debug!("Discovered {} {} ({})", dep.name, dep.version, dep.source);
                discovered.dependencies.push(dep);
            }
            Err(reason) => {
                warn!("Skipping discovery log line {}: {}", line_no, reason);
                discovered.skipped.push(SkippedLine {
                    line: line_no,
                    reason,
                });
            }
        }
    }

    discovered
}

/// Resolve a `--log` argument: either the log file itself, or a discovery
/// output directory containing it
pub fn resolve_log_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(DISCOVERY_LOG_NAME)
    } else {
        path.to_path_buf()
    }
}

/// Read and parse a discovery log file
pub async fn parse_discovery_log(path: &Path) -> Cmake2NixResult<Discovered> {
    let log_file = resolve_log_path(path);
    if !log_file.exists() {
        return Err(Cmake2NixError::DiscoveryLogNotFound(log_file));
    }

    let content = fs::read(&log_file).await.map_err(|e| {
        Cmake2NixError::io(format!("reading discovery log {}", log_file.display()), e)
    })?;

    let discovered = parse_discovery_bytes(&content);
    info!(
        "Discovered {} dependencies from {}",
        discovered.dependencies.len(),
        log_file.display()
    );
    Ok(discovered)
}
