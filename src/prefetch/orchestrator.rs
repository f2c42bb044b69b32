//! Prefetch orchestration
//!
//! Fills in real hashes for every dependency still carrying the
//! placeholder. Fetches run concurrently (bounded by `jobs`), but results
//! are applied to the lock file one at a time by the consuming loop, so
//! each entry has exactly one writer. A failure is recorded and the run
//! carries on; the caller persists whatever was gained.

use super::provider::HashProvider;
use crate::error::Cmake2NixError;
use crate::lock::{LockFile, Source, PLACEHOLDER_HASH};
use futures_util::stream::{self, StreamExt};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Default number of concurrent prefetches
pub const DEFAULT_JOBS: usize = 4;

/// Knobs for a prefetch run
#[derive(Debug, Clone)]
pub struct PrefetchOptions {
    /// Maximum concurrent provider calls (at least 1)
    pub jobs: usize,

    /// When this flips to `true`, no new fetches are started and in-flight
    /// ones are abandoned (their child processes are killed)
    pub cancel: Option<watch::Receiver<bool>>,
}

impl Default for PrefetchOptions {
    fn default() -> Self {
        Self {
            jobs: DEFAULT_JOBS,
            cancel: None,
        }
    }
}

/// A dependency whose hash could not be obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefetchFailure {
    pub name: String,
    pub reason: String,
    /// Tool output, when the provider captured any
    pub output: Option<String>,
}

/// Tally of a prefetch run
#[derive(Debug, Clone, Default)]
pub struct PrefetchReport {
    /// Dependencies in the lock file
    pub total: usize,
    /// Hashes fetched and written during this run
    pub succeeded: usize,
    /// Dependencies that already had a verified hash
    pub skipped: usize,
    /// Per-dependency failures, sorted by name
    pub failures: Vec<PrefetchFailure>,
    /// The run was interrupted before every fetch completed
    pub cancelled: bool,
}

impl PrefetchReport {
    /// Dependencies with a verified hash after the run
    pub fn verified(&self) -> usize {
        self.succeeded + self.skipped
    }

    /// Every dependency now has a verified hash
    pub fn is_complete(&self) -> bool {
        self.verified() == self.total
    }

    /// Dependencies neither verified nor failed (only non-zero if cancelled)
    pub fn not_attempted(&self) -> usize {
        self.total
            .saturating_sub(self.verified() + self.failures.len())
    }

    /// Fraction of dependencies with a verified hash, 1.0 for an empty lock
    pub fn completion_ratio(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.verified() as f64 / self.total as f64
        }
    }
}

/// Progress notifications emitted while prefetching
#[derive(Debug, Clone, Copy)]
pub enum PrefetchEvent<'a> {
    /// Already verified, not fetched
    Skipped { name: &'a str },
    /// Hash fetched and written
    Fetched { name: &'a str, hash: &'a str },
    /// Fetch failed
    Failed { name: &'a str, reason: &'a str },
}

/// Prefetch every unverified dependency in `lock`
pub async fn prefetch_all(
    lock: &mut LockFile,
    provider: &dyn HashProvider,
    options: &PrefetchOptions,
) -> PrefetchReport {
    prefetch_all_with(lock, provider, options, |_| {}).await
}

/// [`prefetch_all`], reporting each outcome to `on_event` as it happens
pub async fn prefetch_all_with<F>(
    lock: &mut LockFile,
    provider: &dyn HashProvider,
    options: &PrefetchOptions,
    mut on_event: F,
) -> PrefetchReport
where
    F: FnMut(PrefetchEvent<'_>),
{
    let mut report = PrefetchReport {
        total: lock.len(),
        ..PrefetchReport::default()
    };
    info!("Prefetching {} dependencies...", report.total);

    let mut queue = Vec::new();
    for dep in lock.dependencies.values() {
        if dep.has_verified_hash() {
            debug!("{} already has hash, skipping", dep.name);
            report.skipped += 1;
            on_event(PrefetchEvent::Skipped { name: &dep.name });
            continue;
        }
        if let Source::Other { method } = &dep.source {
            let reason = if method.is_empty() {
                "no fetch method recorded".to_string()
            } else {
                format!("no provider for fetch method '{}'", method)
            };
            warn!("{} failed: {}", dep.name, reason);
            on_event(PrefetchEvent::Failed {
                name: &dep.name,
                reason: &reason,
            });
            report.failures.push(PrefetchFailure {
                name: dep.name.clone(),
                reason,
                output: None,
            });
            continue;
        }
        queue.push((dep.name.clone(), dep.source.clone()));
    }

    let mut results = stream::iter(queue)
        .map(|(name, source)| async move {
            let result = provider.fetch(&source).await;
            (name, result)
        })
        .buffer_unordered(options.jobs.max(1));

    let mut cancel = options.cancel.clone();
    loop {
        let next = match cancel.as_mut() {
            Some(rx) => tokio::select! {
                biased;
                _ = cancelled(rx) => {
                    warn!("Prefetch cancelled, abandoning in-flight fetches");
                    report.cancelled = true;
                    break;
                }
                next = results.next() => next,
            },
            None => results.next().await,
        };
        let Some((name, result)) = next else {
            break;
        };

        let outcome = result.and_then(|hash| {
            if hash.is_empty() || hash == PLACEHOLDER_HASH {
                Err(Cmake2NixError::hash_extraction(
                    "prefetch",
                    "provider returned no usable hash",
                    hash,
                ))
            } else {
                Ok(hash)
            }
        });

        match outcome {
            Ok(hash) => {
                let Some(dep) = lock.dependencies.get_mut(&name) else {
                    continue;
                };
                if let Some(key) = dep.source.set_hash(hash.clone()) {
                    info!("{} {} = {}", name, key, hash);
                    report.succeeded += 1;
                    on_event(PrefetchEvent::Fetched {
                        name: &name,
                        hash: &hash,
                    });
                }
            }
            Err(e) => {
                let reason = e.to_string();
                warn!("{} failed: {}", name, reason);
                on_event(PrefetchEvent::Failed {
                    name: &name,
                    reason: &reason,
                });
                report.failures.push(PrefetchFailure {
                    output: e.tool_output().map(str::to_string),
                    name,
                    reason,
                });
            }
        }
    }

    report.failures.sort_by(|a, b| a.name.cmp(&b.name));
    info!(
        "Prefetched {}/{} dependencies ({} already verified)",
        report.succeeded,
        report.total - report.skipped,
        report.skipped
    );
    report
}

/// Resolves once cancellation is requested. A dropped sender never cancels.
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|c| *c).await.is_err() {
        std::future::pending::<()>().await;
    }
}
