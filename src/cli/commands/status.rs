//! Status command - show locked dependencies and their hash state

use crate::cli::args::{OutputFormat, StatusArgs};
use crate::config::Config;
use crate::error::Cmake2NixResult;
use crate::lock::{Dependency, HashState, LockFile};
use crate::ui::{self, UiContext};
use console::style;
use serde::Serialize;

/// One row of `status --format json`
#[derive(Debug, Serialize)]
struct StatusRow<'a> {
    name: &'a str,
    version: &'a str,
    method: &'a str,
    source: String,
    hash: Option<&'a str>,
    state: String,
}

impl<'a> From<&'a Dependency> for StatusRow<'a> {
    fn from(dep: &'a Dependency) -> Self {
        Self {
            name: &dep.name,
            version: &dep.version,
            method: dep.source.method(),
            source: dep.source.to_string(),
            hash: dep.source.hash(),
            state: dep.hash_state().to_string(),
        }
    }
}

/// Execute the status command
pub async fn execute(args: StatusArgs, config: &Config) -> Cmake2NixResult<()> {
    let lock_path = config.lock_path();
    let lock = LockFile::load(&lock_path).await?;

    match args.format {
        OutputFormat::Table => print_table(&lock, &lock_path.display().to_string()),
        OutputFormat::Json => print_json(&lock)?,
        OutputFormat::Plain => print_plain(&lock),
    }

    Ok(())
}

fn print_table(lock: &LockFile, path: &str) {
    let ctx = UiContext::detect();
    ui::intro(&ctx, "Locked dependencies");
    ui::key_value(&ctx, "Lock file", path);
    println!();

    if lock.is_empty() {
        ui::step_info(&ctx, "No dependencies in lock file");
        return;
    }

    println!(
        "{:<24} {:<14} {:<16} {:<12}",
        style("NAME").bold(),
        style("VERSION").bold(),
        style("METHOD").bold(),
        style("HASH").bold()
    );
    println!("{}", "-".repeat(68));

    for dep in lock.dependencies.values() {
        let state = dep.hash_state();
        let state_styled = match state {
            HashState::Verified => style(state.to_string()).green(),
            HashState::Placeholder => style(state.to_string()).yellow(),
            HashState::Unsupported => style(state.to_string()).dim(),
        };
        println!(
            "{:<24} {:<14} {:<16} {:<12}",
            dep.name,
            dep.version,
            dep.source.method(),
            state_styled
        );
    }

    println!();
    let verified = lock.verified_count();
    if verified == lock.len() {
        ui::outro_success(
            &ctx,
            &format!("{}/{} hashes verified", verified, lock.len()),
        );
    } else {
        ui::remark(&ctx, "Run: cmake2nix prefetch");
        ui::outro_warn(
            &ctx,
            &format!("{}/{} hashes verified", verified, lock.len()),
        );
    }
}

fn print_json(lock: &LockFile) -> Cmake2NixResult<()> {
    let rows: Vec<StatusRow<'_>> = lock.dependencies.values().map(StatusRow::from).collect();
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

fn print_plain(lock: &LockFile) {
    for dep in lock.dependencies.values() {
        println!("{}\t{}\t{}", dep.name, dep.version, dep.hash_state());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::PLACEHOLDER_HASH;

    #[test]
    fn status_row_from_dependency() {
        let dep = Dependency::github("fmt", "10.2", "fmtlib", "fmt", "10.2.0");
        let row = StatusRow::from(&dep);
        assert_eq!(row.method, "fetchFromGitHub");
        assert_eq!(row.source, "github:fmtlib/fmt@10.2.0");
        assert_eq!(row.hash, Some(PLACEHOLDER_HASH));
        assert_eq!(row.state, "placeholder");

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["name"], "fmt");
        assert_eq!(json["state"], "placeholder");
    }

    #[test]
    fn printing_does_not_panic() {
        let lock = LockFile::from_dependencies([
            Dependency::url("zlib", "1.3", "https://zlib.net/zlib-1.3.tar.gz")
                .with_hash("sha256-abc="),
            Dependency::git("repo", "1", "https://example.com/repo.git", "HEAD"),
        ]);
        print_table(&lock, "cmake-lock.json");
        print_json(&lock).unwrap();
        print_plain(&lock);
        print_table(&LockFile::default(), "cmake-lock.json");
    }
}
