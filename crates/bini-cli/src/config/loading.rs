use crate::config::BiniConfig;
use crate::error::{ConfigError, Result};
use figment::{
    providers::{Env, Format as _, Json, Serialized},
    Figment,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file name, looked up in the project root.
pub const CONFIG_FILE: &str = "bini.config.json";

/// Prefix for environment overrides (`BINI_PORT`, `BINI_APP_DIR`, ...).
pub const ENV_PREFIX: &str = "BINI_";

/// Values that override the merged file configuration.
///
/// Environment variables are snake_case while the file is camelCase, so
/// overrides are extracted separately and applied field by field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigOverrides {
    pub app_dir: Option<PathBuf>,
    pub src_dir: Option<PathBuf>,
    pub router_file: Option<PathBuf>,
    pub debounce_ms: Option<u64>,
    pub suppression_window_ms: Option<u64>,
    pub retention_window_ms: Option<u64>,
    pub dir_grace_ms: Option<u64>,
    pub port: Option<u16>,
    pub node: Option<String>,
}

impl ConfigOverrides {
    /// Overrides read from `BINI_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Figment::from(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(|e| ConfigError::Load(format!("{} (from {}* variables)", e, ENV_PREFIX)).into())
    }

    pub fn with_port(mut self, port: Option<u16>) -> Self {
        if port.is_some() {
            self.port = port;
        }
        self
    }
}

impl BiniConfig {
    /// Load the configuration for the project at `root`.
    ///
    /// Priority: `cli` > environment variables > `bini.config.json` > defaults.
    pub fn load(root: &Path, cli: &ConfigOverrides) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(BiniConfig::default()));

        let file = root.join(CONFIG_FILE);
        if file.is_file() {
            tracing::debug!("Loading {}", file.display());
            figment = figment.merge(Json::file(&file));
        }

        let mut config: BiniConfig = figment
            .extract()
            .map_err(|e| ConfigError::Load(e.to_string()))?;

        config.apply(&ConfigOverrides::from_env()?);
        config.apply(cli);
        config.validate(root)?;

        Ok(config)
    }

    /// Replace every field `overrides` sets.
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref dir) = overrides.app_dir {
            self.app_dir = dir.clone();
        }
        if let Some(ref dir) = overrides.src_dir {
            self.src_dir = dir.clone();
        }
        if let Some(ref file) = overrides.router_file {
            self.router_file = Some(file.clone());
        }
        if let Some(ms) = overrides.debounce_ms {
            self.debounce_ms = ms;
        }
        if let Some(ms) = overrides.suppression_window_ms {
            self.suppression_window_ms = ms;
        }
        if let Some(ms) = overrides.retention_window_ms {
            self.retention_window_ms = ms;
        }
        if let Some(ms) = overrides.dir_grace_ms {
            self.dir_grace_ms = ms;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(ref node) = overrides.node {
            self.node = node.clone();
        }
    }
}
