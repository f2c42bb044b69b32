//! Hash extraction from prefetch tool output
//!
//! The nix-prefetch-* tools disagree on output format: some print JSON,
//! some print a bare hash, and all of them interleave progress chatter.
//! Each tool gets an ordered list of strategies; the first one that yields
//! a hash wins.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Prefix of an SRI sha256 hash
pub const SRI_PREFIX: &str = "sha256-";

/// Captured output of one tool invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// stdout followed by stderr, as an operator would see it in a terminal
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => {
                let mut out = self.stdout.clone();
                if !out.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str(&self.stderr);
                out
            }
        }
    }
}

/// One way of pulling a hash out of tool output
#[derive(Debug, Clone, Copy)]
pub struct Strategy {
    pub name: &'static str,
    pub parse: fn(&ToolOutput) -> Option<String>,
}

/// `nix-prefetch-github` prints JSON with an SRI `hash` field
pub const GITHUB_STRATEGIES: &[Strategy] = &[
    Strategy {
        name: "json.hash",
        parse: json_hash_field,
    },
    Strategy {
        name: "scan",
        parse: scan_sri,
    },
];

/// `nix-prefetch-git` prints JSON; newer versions include an SRI `hash`,
/// all of them a `sha256` field that may be bare
pub const GIT_STRATEGIES: &[Strategy] = &[
    Strategy {
        name: "json.hash",
        parse: json_hash_field,
    },
    Strategy {
        name: "json.sha256",
        parse: json_sha256_field,
    },
    Strategy {
        name: "scan",
        parse: scan_sri,
    },
];

/// `nix-prefetch-url` has no structured output
pub const URL_STRATEGIES: &[Strategy] = &[Strategy {
    name: "scan",
    parse: scan_sri,
}];

/// Run strategies in order and return the first hash found
pub fn extract_hash(output: &ToolOutput, strategies: &[Strategy]) -> Option<String> {
    strategies.iter().find_map(|s| {
        let found = (s.parse)(output);
        if let Some(ref hash) = found {
            tracing::trace!("hash found by {}: {}", s.name, hash);
        }
        found
    })
}

fn sri_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"sha256-[A-Za-z0-9+/=]+").expect("sri regex must compile"))
}

/// Find the first `sha256-<base64>` token anywhere in the output
pub fn scan_sri(output: &ToolOutput) -> Option<String> {
    sri_re()
        .find(&output.combined())
        .map(|m| m.as_str().to_string())
}

/// Prefix a bare hash with `sha256-`; SRI hashes pass through
pub fn normalize_sri(hash: &str) -> String {
    let hash = hash.trim();
    if hash.starts_with(SRI_PREFIX) {
        hash.to_string()
    } else {
        format!("{}{}", SRI_PREFIX, hash)
    }
}

/// The JSON object printed on stdout, tolerating chatter around it
fn json_object(output: &ToolOutput) -> Option<Map<String, Value>> {
    let stdout = output.stdout.trim();
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(stdout) {
        return Some(map);
    }

    let start = stdout.find('{')?;
    let end = stdout.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&stdout[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn json_string_field(output: &ToolOutput, key: &str) -> Option<String> {
    json_object(output)?
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// `{"hash": "sha256-..."}`
pub fn json_hash_field(output: &ToolOutput) -> Option<String> {
    json_string_field(output, "hash")
}

/// `{"sha256": "..."}`, normalized to SRI form
pub fn json_sha256_field(output: &ToolOutput) -> Option<String> {
    json_string_field(output, "sha256").map(|h| normalize_sri(&h))
}
