//! CLI command implementations

pub mod completions;
pub mod config;
pub mod discover;
pub mod init;
pub mod lock;
pub mod prefetch;
pub mod status;

pub use completions::execute as completions;
pub use config::execute as config;
pub use discover::execute as discover;
pub use init::execute as init;
pub use lock::execute as lock;
pub use prefetch::execute as prefetch;
pub use status::execute as status;
