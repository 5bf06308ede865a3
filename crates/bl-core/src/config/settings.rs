//! Merged settings snapshot and the provider that maintains it

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use super::{load_config, save_config, BoardConfig, ProjectConfig, TimingConfig};
use crate::error::ConfigError;
use crate::types::Address;

/// Effective settings for the current project
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Global config with project overrides applied
    pub config: BoardConfig,
    /// Root of the open project, if any
    pub project_root: Option<PathBuf>,
}

impl Settings {
    /// Configured board address, `None` when blank
    pub fn address(&self) -> Option<Address> {
        let address = self.config.address.trim();
        if address.is_empty() {
            None
        } else {
            Some(Address::new(address))
        }
    }

    /// Autoconnect is enabled
    pub fn auto_connect(&self) -> bool {
        self.config.auto_connect
    }

    /// Scheduling constants
    pub fn timing(&self) -> TimingConfig {
        self.config.timing
    }

    /// File extensions eligible for upload
    pub fn allowed_file_types(&self) -> Vec<String> {
        self.config
            .sync_file_types
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config: BoardConfig::default(),
            project_root: None,
        }
    }
}

/// Supplies the current settings to the orchestrator
pub trait SettingsProvider: Send + Sync {
    /// Current snapshot
    fn settings(&self) -> Settings;

    /// Re-read both layers.
    ///
    /// On a project file format error the snapshot falls back to the global
    /// values and the error is returned so the caller can report it.
    fn reload(&self) -> Result<Settings, ConfigError>;

    /// Switch to another project root and reload
    fn set_project_root(&self, root: Option<PathBuf>) -> Result<Settings, ConfigError>;

    /// Whether a global settings file existed at startup
    fn settings_exist(&self) -> bool;
}

/// File-backed settings: global TOML plus project JSON
pub struct FileSettings {
    /// Global config path; `None` keeps the global layer in memory
    global_path: Option<PathBuf>,
    global: RwLock<BoardConfig>,
    project_root: RwLock<Option<PathBuf>>,
    current: RwLock<Settings>,
    existed: bool,
}

impl FileSettings {
    /// Load settings from `global_path` and the project in `project_root`
    pub fn new(global_path: PathBuf, project_root: Option<PathBuf>) -> Self {
        let existed = global_path.exists();
        let global = read_global(&global_path);
        let settings = Self {
            global_path: Some(global_path),
            global: RwLock::new(global),
            project_root: RwLock::new(project_root),
            current: RwLock::new(Settings::default()),
            existed,
        };
        if let Err(e) = settings.merge() {
            tracing::warn!("Project config ignored: {}", e);
        }
        settings
    }

    /// Settings kept entirely in memory
    pub fn in_memory(config: BoardConfig) -> Self {
        let settings = Self {
            global_path: None,
            global: RwLock::new(config),
            project_root: RwLock::new(None),
            current: RwLock::new(Settings::default()),
            existed: true,
        };
        // No project root, so merging cannot fail
        let _ = settings.merge();
        settings
    }

    /// Change the global layer, persisting it when file-backed
    pub fn update_global(
        &self,
        change: impl FnOnce(&mut BoardConfig),
    ) -> Result<Settings, ConfigError> {
        {
            let mut global = write_lock(&self.global);
            change(&mut *global);
            if let Some(path) = &self.global_path {
                save_config(path, &*global)?;
            }
        }
        self.merge()
    }

    /// Path of the global config file, if file-backed
    pub fn global_path(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    fn merge(&self) -> Result<Settings, ConfigError> {
        let global = read_lock(&self.global).clone();
        let project_root = read_lock(&self.project_root).clone();

        let (config, result) = match &project_root {
            Some(root) => match ProjectConfig::load(root) {
                Ok(project) => (project.apply(&global), Ok(())),
                Err(e) => (global, Err(e)),
            },
            None => (global, Ok(())),
        };

        let settings = Settings {
            config,
            project_root,
        };
        *write_lock(&self.current) = settings.clone();
        result.map(|_| settings)
    }
}

impl SettingsProvider for FileSettings {
    fn settings(&self) -> Settings {
        read_lock(&self.current).clone()
    }

    fn reload(&self) -> Result<Settings, ConfigError> {
        if let Some(path) = &self.global_path {
            *write_lock(&self.global) = read_global(path);
        }
        self.merge()
    }

    fn set_project_root(&self, root: Option<PathBuf>) -> Result<Settings, ConfigError> {
        tracing::info!("Project root changed to {:?}", root);
        *write_lock(&self.project_root) = root;
        self.merge()
    }

    fn settings_exist(&self) -> bool {
        self.existed
    }
}

fn read_global(path: &Path) -> BoardConfig {
    if !path.exists() {
        tracing::info!("Using default configuration");
        return BoardConfig::default();
    }
    load_config(path).unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from {:?}: {}", path, e);
        BoardConfig::default()
    })
}

fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PROJECT_CONFIG_FILE;
    use tempfile::TempDir;

    #[test]
    fn test_missing_global_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = FileSettings::new(dir.path().join("config.toml"), None);

        assert!(!settings.settings_exist());
        assert_eq!(settings.settings().config, BoardConfig::default());
    }

    #[test]
    fn test_project_overrides_global() {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join("project");
        std::fs::create_dir_all(&project).unwrap();
        std::fs::write(project.join(PROJECT_CONFIG_FILE), r#"{"address": "COM7"}"#).unwrap();

        let settings = FileSettings::new(dir.path().join("config.toml"), Some(project));
        assert_eq!(settings.settings().address(), Some(Address::new("COM7")));
    }

    #[test]
    fn test_format_error_falls_back_to_global() {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join("project");
        std::fs::create_dir_all(&project).unwrap();

        let settings = FileSettings::new(dir.path().join("config.toml"), Some(project.clone()));
        std::fs::write(project.join(PROJECT_CONFIG_FILE), "{ not json").unwrap();

        assert!(matches!(settings.reload(), Err(ConfigError::Json(_))));
        assert_eq!(settings.settings().config.address, BoardConfig::default().address);
    }

    #[test]
    fn test_update_global_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let settings = FileSettings::new(path.clone(), None);

        settings.update_global(|c| c.auto_connect = false).unwrap();
        assert!(!settings.settings().auto_connect());

        let reread = FileSettings::new(path, None);
        assert!(reread.settings_exist());
        assert!(!reread.settings().auto_connect());
    }

    #[test]
    fn test_blank_address_is_none() {
        let settings = FileSettings::in_memory(BoardConfig {
            address: "  ".to_string(),
            ..Default::default()
        });
        assert_eq!(settings.settings().address(), None);
    }

    #[test]
    fn test_allowed_file_types() {
        let settings = FileSettings::in_memory(BoardConfig {
            sync_file_types: "py, txt ,,json".to_string(),
            ..Default::default()
        });
        assert_eq!(
            settings.settings().allowed_file_types(),
            vec!["py".to_string(), "txt".to_string(), "json".to_string()]
        );
    }
}
