//! Shared helpers for command implementations.

use crate::config::{BiniConfig, ConfigOverrides};
use crate::error::{CliError, Result};
use std::path::{Path, PathBuf};

/// Get the current working directory.
pub fn get_cwd() -> Result<PathBuf> {
    std::env::current_dir().map_err(|e| {
        CliError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to get current directory: {}", e),
        ))
    })
}

/// Resolve `--cwd` against the current directory.
pub fn resolve_root(cwd: Option<&Path>) -> Result<PathBuf> {
    let current = get_cwd()?;
    let root = match cwd {
        Some(dir) if dir.is_absolute() => dir.to_path_buf(),
        Some(dir) => current.join(dir),
        None => current,
    };

    if !root.is_dir() {
        return Err(CliError::FileNotFound(root));
    }
    // Watchers report canonical paths
    Ok(root.canonicalize()?)
}

/// Resolve the project root and load its configuration.
pub fn load_project(cwd: Option<&Path>, overrides: &ConfigOverrides) -> Result<(PathBuf, BiniConfig)> {
    let root = resolve_root(cwd)?;
    let config = BiniConfig::load(&root, overrides)?;
    Ok((root, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_root_absolute() {
        let temp = TempDir::new().unwrap();
        assert_eq!(
            resolve_root(Some(temp.path())).unwrap(),
            temp.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_resolve_root_missing_dir() {
        let err = resolve_root(Some(Path::new("/definitely/not/here"))).unwrap_err();
        assert!(matches!(err, CliError::FileNotFound(_)));
    }
}
