//! Hash prefetching
//!
//! Replaces placeholder hashes in the lock file with verified ones by
//! running the nix-prefetch-* tools.
//!
//! | Fetcher | Tool | Output parsing |
//! |---------|------|----------------|
//! | `fetchFromGitHub` | `nix-prefetch-github owner repo --rev rev` | JSON `hash`, then scan |
//! | `fetchgit` | `nix-prefetch-git --url url --rev rev` | JSON `hash`, JSON `sha256`, then scan |
//! | `fetchurl` | `nix-prefetch-url url` | scan |

pub mod extract;
pub mod orchestrator;
pub mod provider;

pub use extract::{extract_hash, ToolOutput};
pub use orchestrator::{
    prefetch_all, prefetch_all_with, PrefetchEvent, PrefetchFailure, PrefetchOptions,
    PrefetchReport, DEFAULT_JOBS,
};
pub use provider::{HashProvider, NixPrefetcher};
