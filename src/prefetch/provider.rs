//! Hash providers
//!
//! A provider turns a dependency's [`Source`] into a verified integrity
//! hash. The production provider shells out to the nix-prefetch-* tools;
//! tests substitute their own implementation of [`HashProvider`].

use super::extract::{
    extract_hash, Strategy, ToolOutput, GITHUB_STRATEGIES, GIT_STRATEGIES, URL_STRATEGIES,
};
use crate::config::schema::PrefetchConfig;
use crate::error::{Cmake2NixError, Cmake2NixResult};
use crate::lock::Source;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Computes the integrity hash of a dependency's source
#[async_trait]
pub trait HashProvider: Send + Sync {
    /// Fetch `source` and return its SRI hash
    async fn fetch(&self, source: &Source) -> Cmake2NixResult<String>;
}

/// Provider backed by the nix-prefetch-github / nix-prefetch-git /
/// nix-prefetch-url tools
#[derive(Debug, Clone)]
pub struct NixPrefetcher {
    github_tool: String,
    git_tool: String,
    url_tool: String,
    timeout: Duration,
}

/// A fully resolved tool call
#[derive(Debug, Clone)]
struct Invocation<'a> {
    program: &'a str,
    args: Vec<String>,
    strategies: &'static [Strategy],
}

impl NixPrefetcher {
    /// Create a prefetcher using the standard tool names
    pub fn new(timeout: Duration) -> Self {
        Self::from_config(&PrefetchConfig {
            timeout_secs: timeout.as_secs(),
            ..PrefetchConfig::default()
        })
    }

    pub fn from_config(config: &PrefetchConfig) -> Self {
        Self {
            github_tool: config.github_tool.clone(),
            git_tool: config.git_tool.clone(),
            url_tool: config.url_tool.clone(),
            timeout: Duration::from_secs(config.timeout_secs.max(1)),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn invocation(&self, source: &Source) -> Option<Invocation<'_>> {
        let inv = match source {
            Source::GitHub {
                owner, repo, rev, ..
            } => Invocation {
                program: &self.github_tool,
                args: vec![owner.clone(), repo.clone(), "--rev".into(), rev.clone()],
                strategies: GITHUB_STRATEGIES,
            },
            Source::Git { url, rev, .. } => Invocation {
                program: &self.git_tool,
                args: vec!["--url".into(), url.clone(), "--rev".into(), rev.clone()],
                strategies: GIT_STRATEGIES,
            },
            Source::Url { url, .. } => Invocation {
                program: &self.url_tool,
                args: vec![url.clone()],
                strategies: URL_STRATEGIES,
            },
            Source::Other { .. } => return None,
        };
        Some(inv)
    }

    /// Run a tool to completion, capturing its output.
    ///
    /// The child is killed if the timeout expires or the future is dropped.
    async fn run_tool(&self, program: &str, args: &[String]) -> Cmake2NixResult<ToolOutput> {
        debug!("Executing: {} {:?}", program, args);

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Err(_) => {
                return Err(Cmake2NixError::hash_extraction(
                    program,
                    format!("timed out after {}s", self.timeout.as_secs()),
                    "",
                ))
            }
            Ok(Err(e)) => {
                return Err(Cmake2NixError::hash_extraction(
                    program,
                    format!("failed to start: {}", e),
                    "",
                ))
            }
            Ok(Ok(output)) => output,
        };

        let captured = ToolOutput::new(
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );

        if !output.status.success() {
            return Err(Cmake2NixError::hash_extraction(
                program,
                format!("exited with {}", output.status),
                captured.combined(),
            ));
        }

        Ok(captured)
    }
}

#[async_trait]
impl HashProvider for NixPrefetcher {
    async fn fetch(&self, source: &Source) -> Cmake2NixResult<String> {
        let inv = self.invocation(source).ok_or_else(|| {
            Cmake2NixError::hash_extraction(
                "prefetch",
                format!("no provider for fetch method '{}'", source.method()),
                "",
            )
        })?;

        let output = self.run_tool(inv.program, &inv.args).await?;

        extract_hash(&output, inv.strategies).ok_or_else(|| {
            Cmake2NixError::hash_extraction(
                inv.program,
                "no hash found in output",
                output.combined(),
            )
        })
    }
}
