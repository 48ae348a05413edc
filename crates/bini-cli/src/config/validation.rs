use crate::config::BiniConfig;
use crate::error::{ConfigError, Result};
use std::path::{Component, Path};

/// Whether `path` stays inside `root` once joined to it.
pub fn is_inside(root: &Path, path: &Path) -> bool {
    if path.is_absolute() {
        return path.starts_with(root)
            && !path.components().any(|c| c == Component::ParentDir);
    }
    !path
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
}

impl BiniConfig {
    /// Validate configuration for logical consistency.
    pub fn validate(&self, root: &Path) -> Result<()> {
        if self.debounce_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "debounceMs".to_string(),
                value: "0".to_string(),
                hint: "Use a positive delay; 50 is the default".to_string(),
            }
            .into());
        }

        if self.retention_window_ms < self.suppression_window_ms {
            return Err(ConfigError::InvalidValue {
                field: "retentionWindowMs".to_string(),
                value: self.retention_window_ms.to_string(),
                hint: format!(
                    "Must be at least suppressionWindowMs ({})",
                    self.suppression_window_ms
                ),
            }
            .into());
        }

        if self.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "port".to_string(),
                value: "0".to_string(),
                hint: "Use a port between 1 and 65535".to_string(),
            }
            .into());
        }

        if self.node.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "node".to_string(),
                value: String::new(),
                hint: "Name the Node.js binary, e.g. \"node\"".to_string(),
            }
            .into());
        }

        for (field, path) in [("appDir", &self.app_dir), ("srcDir", &self.src_dir)] {
            if !is_inside(root, path) {
                return Err(ConfigError::OutsideProject {
                    field: field.to_string(),
                    path: path.clone(),
                }
                .into());
            }
        }
        if let Some(ref file) = self.router_file {
            if !is_inside(root, file) {
                return Err(ConfigError::OutsideProject {
                    field: "routerFile".to_string(),
                    path: file.clone(),
                }
                .into());
            }
        }

        Ok(())
    }
}
