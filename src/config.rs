//! User configuration loaded from `config.toml` in the data directory.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, TaskMasterError};
use crate::fields::{SortOption, ViewType};

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const STORE_FILE_NAME: &str = "tasks.json";
pub const LOG_FILE_NAME: &str = "task_master.log";

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Owner recorded on newly created items.
    pub user_id: String,
    /// Sort mode the views open with.
    pub default_sort: String,
    /// View the TUI opens on.
    pub default_view: ViewType,
    /// Log filter used when `TM_LOG` is unset.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            user_id: std::env::var("USER").unwrap_or_else(|_| "local".to_string()),
            default_sort: "manual".to_string(),
            default_view: ViewType::Task,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a specific path.
    /// Returns default config if the file doesn't exist.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| TaskMasterError::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        toml::from_str(&content)
            .map_err(|e| TaskMasterError::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Unknown sort names fall back to manual order.
    pub fn sort(&self) -> SortOption {
        SortOption::parse_lenient(&self.default_sort)
    }
}

/// `$HOME/.task_master`, or `./.task_master` when HOME is unset.
pub fn default_data_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".task_master")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from_path(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config.sort(), SortOption::Manual);
        assert_eq!(config.default_view, ViewType::Task);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "user_id = \"dana\"\ndefault_view = \"level_up\"\n").unwrap();
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.user_id, "dana");
        assert_eq!(config.default_view, ViewType::LevelUp);
        assert_eq!(config.default_sort, "manual");
    }

    #[test]
    fn test_unknown_sort_falls_back() {
        let config = Config { default_sort: "random".into(), ..Config::default() };
        assert_eq!(config.sort(), SortOption::Manual);
        let config = Config { default_sort: "created_desc".into(), ..Config::default() };
        assert_eq!(config.sort(), SortOption::CreatedDesc);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "user_id = [").unwrap();
        assert!(matches!(Config::load_from_path(&path), Err(TaskMasterError::Config(_))));
    }
}
