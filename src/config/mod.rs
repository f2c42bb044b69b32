//! Configuration management for cmake2nix

pub mod schema;

pub use schema::Config;

use crate::error::{Cmake2NixError, Cmake2NixResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// File name of the project-local config
pub const LOCAL_CONFIG_NAME: &str = "cmake2nix.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cmake2nix")
            .join("config.toml")
    }

    /// Walk up from `start` looking for a project-local config
    pub fn find_local_config(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(LOCAL_CONFIG_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Load the global config with a project-local config layered on top.
    ///
    /// A missing global file means defaults. Tables are merged key by key,
    /// so a local file only needs to name the settings it changes.
    pub async fn load_merged(&self, local: Option<&Path>) -> Cmake2NixResult<Config> {
        let mut merged = if self.config_path.exists() {
            Self::read_table(&self.config_path).await?
        } else {
            debug!("Config file not found, using defaults");
            toml::Table::new()
        };

        let Some(local) = local else {
            return Self::from_table(merged, &self.config_path);
        };

        debug!("Merging local config {}", local.display());
        let overlay = Self::read_table(local).await?;
        merge_tables(&mut merged, overlay);

        let mut config = Self::from_table(merged, local)?;
        config.project_root = local.parent().map(Path::to_path_buf);
        Ok(config)
    }

    async fn read_table(path: &Path) -> Cmake2NixResult<toml::Table> {
        let content = fs::read_to_string(path).await.map_err(|e| {
            Cmake2NixError::io(format!("reading config from {}", path.display()), e)
        })?;

        content
            .parse::<toml::Table>()
            .map_err(|e| Cmake2NixError::ConfigInvalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    fn from_table(table: toml::Table, path: &Path) -> Cmake2NixResult<Config> {
        toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| Cmake2NixError::ConfigInvalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> Cmake2NixResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            Cmake2NixError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> Cmake2NixResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Cmake2NixError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Recursively overlay `overlay` onto `base`
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_default_when_missing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nonexistent.toml");
        let manager = ConfigManager::with_path(path);

        let config = manager.load_merged(None).await.unwrap();
        assert_eq!(config.prefetch.jobs, 4);
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        let manager = ConfigManager::with_path(path);

        let mut config = Config::default();
        config.prefetch.git_tool = "/usr/local/bin/nix-prefetch-git".to_string();

        manager.save(&config).await.unwrap();
        let loaded = manager.load_merged(None).await.unwrap();

        assert_eq!(loaded.prefetch.git_tool, "/usr/local/bin/nix-prefetch-git");
    }

    #[tokio::test]
    async fn invalid_config_is_reported() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[prefetch]\njobs = \"many\"\n").unwrap();

        let err = ConfigManager::with_path(path)
            .load_merged(None)
            .await
            .unwrap_err();
        assert!(matches!(err, Cmake2NixError::ConfigInvalid { .. }));
    }

    #[tokio::test]
    async fn invalid_local_config_names_local_file() {
        let temp = TempDir::new().unwrap();
        let local = temp.path().join(LOCAL_CONFIG_NAME);
        std::fs::write(&local, "[lock]
path = [
").unwrap();

        let err = ConfigManager::with_path(temp.path().join("none.toml"))
            .load_merged(Some(&local))
            .await
            .unwrap_err();
        match err {
            Cmake2NixError::ConfigInvalid { path, .. } => assert_eq!(path, local),
            other => panic!("expected ConfigInvalid, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn local_overrides_global_per_key() {
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("config.toml");
        std::fs::write(&global, "[prefetch]\njobs = 2\ntimeout_secs = 60\n").unwrap();

        let project = temp.path().join("project");
        std::fs::create_dir(&project).unwrap();
        let local = project.join(LOCAL_CONFIG_NAME);
        std::fs::write(&local, "[prefetch]\njobs = 8\n\n[lock]\npath = \"nix/lock.json\"\n")
            .unwrap();

        let config = ConfigManager::with_path(global)
            .load_merged(Some(&local))
            .await
            .unwrap();

        assert_eq!(config.prefetch.jobs, 8);
        assert_eq!(config.prefetch.timeout_secs, 60);
        assert_eq!(config.lock_path(), project.join("nix/lock.json"));
    }

    #[tokio::test]
    async fn load_merged_without_any_files() {
        let temp = TempDir::new().unwrap();
        let config = ConfigManager::with_path(temp.path().join("none.toml"))
            .load_merged(None)
            .await
            .unwrap();
        assert!(config.project_root.is_none());
        assert_eq!(config.lock_path(), PathBuf::from("cmake-lock.json"));
    }

    #[test]
    fn find_local_config_walks_up() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("src").join("lib");
        std::fs::create_dir_all(&nested).unwrap();

        let local = temp.path().join(LOCAL_CONFIG_NAME);
        std::fs::write(&local, "").unwrap();
        assert_eq!(ConfigManager::find_local_config(&nested), Some(local));
    }
}
