//! Platform directories for configuration and logs.

use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("could not determine OS configuration directory")]
    NoConfigDir,

    #[error("platform I/O error: {0}")]
    Io(#[from] io::Error),
}

/// OS-specific directories for the orrery.
///
/// XDG on Linux, Known Folders on Windows, Library on macOS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformDirs {
    /// Holds `config.ron`.
    pub config_dir: PathBuf,
    pub log_dir: PathBuf,
}

const APP_NAME: &str = "orrery";

impl PlatformDirs {
    /// Resolve directories without creating them. An explicit config
    /// directory replaces the OS location and keeps its logs beside it.
    pub fn resolve(config_override: Option<&Path>) -> Result<Self, PlatformError> {
        if let Some(dir) = config_override {
            return Ok(Self {
                config_dir: dir.to_path_buf(),
                log_dir: dir.join("logs"),
            });
        }
        let app_config = dirs::config_dir()
            .ok_or(PlatformError::NoConfigDir)?
            .join(APP_NAME);
        let log_dir = dirs::data_local_dir()
            .map(|dir| dir.join(APP_NAME).join("logs"))
            .unwrap_or_else(|| app_config.join("logs"));
        Ok(Self {
            config_dir: app_config,
            log_dir,
        })
    }

    /// Resolve directories and create them on disk.
    pub fn resolve_and_create(config_override: Option<&Path>) -> Result<Self, PlatformError> {
        let dirs = Self::resolve(config_override)?;
        std::fs::create_dir_all(&dirs.config_dir)?;
        std::fs::create_dir_all(&dirs.log_dir)?;
        Ok(dirs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_places_logs_beside_config() {
        let dirs = PlatformDirs::resolve(Some(Path::new("custom"))).unwrap();
        assert_eq!(dirs.config_dir, PathBuf::from("custom"));
        assert_eq!(dirs.log_dir, Path::new("custom").join("logs"));
    }

    #[test]
    fn test_resolved_dirs_are_absolute() {
        // Headless CI may lack a home directory.
        let Ok(dirs) = PlatformDirs::resolve(None) else {
            return;
        };
        assert!(dirs.config_dir.is_absolute());
        assert!(dirs.log_dir.is_absolute());
        assert!(dirs.config_dir.ends_with(APP_NAME));
    }

    #[test]
    fn test_directory_creation() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("orrery-config");
        let dirs = PlatformDirs::resolve_and_create(Some(&root)).unwrap();
        assert!(dirs.config_dir.exists());
        assert!(dirs.log_dir.exists());
    }
}
