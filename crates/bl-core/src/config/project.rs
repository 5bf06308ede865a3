//! Per-project configuration overrides

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::BoardConfig;
use crate::error::ConfigError;

/// Name of the project config file, looked up in the project root
pub const PROJECT_CONFIG_FILE: &str = "boardlink.conf";

/// Project-scoped keys; any key present overrides the global value.
///
/// `auto_connect` and `ctrl_c_on_connect` are deliberately absent from new
/// project files but still honoured when a user adds them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_file_types: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_all_file_types: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctrl_c_on_connect: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_on_start: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safe_boot_on_upload: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reboot_after_upload: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statusbar_buttons: Option<Vec<String>>,
}

impl ProjectConfig {
    /// Read the project file in `project_root`.
    ///
    /// A missing file is an empty override set; malformed JSON is an error.
    pub fn load(project_root: &Path) -> Result<Self, ConfigError> {
        let path = project_root.join(PROJECT_CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(ConfigError::Invalid(format!(
                    "Failed to read {:?}: {}",
                    path, e
                )))
            }
        };

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        Ok(serde_json::from_str(&content)?)
    }

    /// A project file pre-filled from the global settings
    pub fn from_global(global: &BoardConfig) -> Self {
        Self {
            address: Some(global.address.clone()),
            username: Some(global.username.clone()),
            password: Some(global.password.clone()),
            sync_folder: Some(global.sync_folder.clone()),
            sync_file_types: Some(global.sync_file_types.clone()),
            sync_all_file_types: Some(global.sync_all_file_types),
            ctrl_c_on_connect: None,
            open_on_start: Some(global.open_on_start),
            safe_boot_on_upload: Some(global.safe_boot_on_upload),
            reboot_after_upload: None,
            statusbar_buttons: Some(global.statusbar_buttons.clone()),
        }
    }

    /// Write this config as pretty JSON into `project_root`.
    ///
    /// Refuses to overwrite an existing project file.
    pub fn create(&self, project_root: &Path) -> Result<(), ConfigError> {
        let path = project_root.join(PROJECT_CONFIG_FILE);
        if path.exists() {
            return Err(ConfigError::Invalid(format!(
                "Project config already exists: {:?}",
                path
            )));
        }

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)
            .map_err(|e| ConfigError::Invalid(format!("Failed to write {:?}: {}", path, e)))?;
        Ok(())
    }

    /// Overlay these overrides onto a copy of the global config
    pub fn apply(&self, global: &BoardConfig) -> BoardConfig {
        let mut merged = global.clone();

        if let Some(v) = &self.address {
            merged.address = v.clone();
        }
        if let Some(v) = &self.username {
            merged.username = v.clone();
        }
        if let Some(v) = &self.password {
            merged.password = v.clone();
        }
        if let Some(v) = &self.sync_folder {
            merged.sync_folder = v.clone();
        }
        if let Some(v) = &self.sync_file_types {
            merged.sync_file_types = v.clone();
        }
        if let Some(v) = self.sync_all_file_types {
            merged.sync_all_file_types = v;
        }
        if let Some(v) = self.ctrl_c_on_connect {
            merged.ctrl_c_on_connect = v;
        }
        if let Some(v) = self.open_on_start {
            merged.open_on_start = v;
        }
        if let Some(v) = self.safe_boot_on_upload {
            merged.safe_boot_on_upload = v;
        }
        if let Some(v) = self.reboot_after_upload {
            merged.reboot_after_upload = v;
        }
        if let Some(v) = &self.statusbar_buttons {
            merged.statusbar_buttons = v.clone();
        }

        merged
    }
}
