//! cmake2nix - Lock CMake dependencies for Nix builds
//!
//! Turns the dependencies a CMake project fetches at configure time into a
//! lock file of Nix fetchers with verified integrity hashes. The lock file
//! is merged across runs so hashes that were already prefetched survive
//! re-discovery.

pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod lock;
pub mod prefetch;
pub mod ui;

pub use error::{Cmake2NixError, Cmake2NixResult};
