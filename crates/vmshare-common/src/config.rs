//! Global configuration model for vmshare.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, VmshareError};

/// Root configuration. Every field falls back to its Linux default when
/// absent from the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmshareConfig {
    /// Root of the shared directory tree exposed to guests.
    pub shared_dir: PathBuf,
    /// Mount table consulted for device path and filesystem type.
    pub mount_table: PathBuf,
    /// Sysfs block device directory used for device-mapper detection.
    pub sysfs_block_dir: PathBuf,
}

impl Default for VmshareConfig {
    fn default() -> Self {
        Self {
            shared_dir: PathBuf::from(crate::constants::DEFAULT_SHARED_DIR),
            mount_table: PathBuf::from(crate::constants::PROC_MOUNTS_FILE),
            sysfs_block_dir: PathBuf::from(crate::constants::SYSFS_BLOCK_DIR),
        }
    }
}

impl VmshareConfig {
    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// names a relative path.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| VmshareError::Config {
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every configured path is absolute.
    ///
    /// # Errors
    ///
    /// Returns [`VmshareError::Config`] naming the first relative path.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("shared_dir", &self.shared_dir),
            ("mount_table", &self.mount_table),
            ("sysfs_block_dir", &self.sysfs_block_dir),
        ] {
            if !value.is_absolute() {
                return Err(VmshareError::Config {
                    message: format!("{name} must be an absolute path, got {}", value.display()),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_uses_linux_paths() {
        let config = VmshareConfig::default();
        assert_eq!(config.mount_table, PathBuf::from("/proc/mounts"));
        assert_eq!(config.sysfs_block_dir, PathBuf::from("/sys/dev/block"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_fills_missing_fields_with_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("vmshare.json");
        std::fs::write(&path, r#"{ "shared_dir": "/srv/shared" }"#).expect("write");

        let config = VmshareConfig::load(&path).expect("load");
        assert_eq!(config.shared_dir, PathBuf::from("/srv/shared"));
        assert_eq!(config.mount_table, PathBuf::from("/proc/mounts"));
    }

    #[test]
    fn load_rejects_relative_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("vmshare.json");
        std::fs::write(&path, r#"{ "mount_table": "mounts" }"#).expect("write");

        let err = VmshareConfig::load(&path).expect_err("relative path");
        assert!(matches!(err, VmshareError::Config { .. }));
    }

    #[test]
    fn load_reports_invalid_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("vmshare.json");
        std::fs::write(&path, "{ not json").expect("write");

        assert!(matches!(
            VmshareConfig::load(&path),
            Err(VmshareError::Serialization { .. })
        ));
    }
}
