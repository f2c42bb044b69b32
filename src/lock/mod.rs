//! Dependency lock file
//!
//! The lock file pins every discovered dependency to a Nix fetcher and an
//! integrity hash. It is created by discovery, filled in by prefetching,
//! and merged rather than rewritten on every re-run so verified hashes
//! survive.

pub mod dependency;
pub mod ledger;

pub use dependency::{
    Dependency, HashState, Source, DEFAULT_REV, METHOD_GIT, METHOD_GITHUB, METHOD_URL,
    PLACEHOLDER_HASH, UNKNOWN_VERSION,
};
pub use ledger::{LockFile, MergeSummary, LOCK_FORMAT_VERSION};
