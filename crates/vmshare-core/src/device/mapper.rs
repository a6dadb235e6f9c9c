//! Device-mapper detection through sysfs.
//!
//! A block device `<major>:<minor>` is device-mapper backed (LVM, dm-crypt,
//! thin pools) when `/sys/dev/block/<major>:<minor>/dm` exists. The check is
//! a [`DeviceMapperProbe`] so callers can substitute a fake.

use std::path::{Path, PathBuf};

use nix::errno::Errno;
use vmshare_common::constants::{DEVICE_MAPPER_ENTRY, SYSFS_BLOCK_DIR};
use vmshare_common::error::{Result, VmshareError};

use super::{Device, get_device_for_path};

/// Strategy deciding whether a block device is device-mapper backed.
pub trait DeviceMapperProbe {
    /// Returns whether the device `major:minor` is a device-mapper device.
    ///
    /// # Errors
    ///
    /// Returns an error if the check itself fails. An error never means
    /// "not device-mapper".
    fn is_device_mapper(&self, major: u32, minor: u32) -> Result<bool>;
}

impl<F> DeviceMapperProbe for F
where
    F: Fn(u32, u32) -> Result<bool>,
{
    fn is_device_mapper(&self, major: u32, minor: u32) -> Result<bool> {
        self(major, minor)
    }
}

/// Probe backed by the sysfs block device directory.
#[derive(Debug, Clone)]
pub struct SysfsDeviceMapperProbe {
    block_dir: PathBuf,
}

impl SysfsDeviceMapperProbe {
    /// Creates a probe rooted at `block_dir` instead of `/sys/dev/block`.
    #[must_use]
    pub fn new(block_dir: impl Into<PathBuf>) -> Self {
        Self {
            block_dir: block_dir.into(),
        }
    }

    /// Path whose existence marks `major:minor` as device-mapper.
    #[must_use]
    pub fn entry_path(&self, major: u32, minor: u32) -> PathBuf {
        self.block_dir
            .join(format!("{major}:{minor}"))
            .join(DEVICE_MAPPER_ENTRY)
    }
}

impl Default for SysfsDeviceMapperProbe {
    fn default() -> Self {
        Self::new(SYSFS_BLOCK_DIR)
    }
}

impl DeviceMapperProbe for SysfsDeviceMapperProbe {
    fn is_device_mapper(&self, major: u32, minor: u32) -> Result<bool> {
        let path = self.entry_path(major, minor);
        match nix::sys::stat::stat(&path) {
            Ok(_) => Ok(true),
            Err(Errno::ENOENT) => Ok(false),
            Err(e) => Err(VmshareError::DeviceMapperProbe {
                path,
                source: e.into(),
            }),
        }
    }
}

/// Checks the live sysfs tree for a device-mapper device.
///
/// # Errors
///
/// Returns [`VmshareError::DeviceMapperProbe`] if the sysfs entry cannot be
/// checked for a reason other than absence.
pub fn is_device_mapper(major: u32, minor: u32) -> Result<bool> {
    SysfsDeviceMapperProbe::default().is_device_mapper(major, minor)
}

/// A resolved device together with its device-mapper classification, as
/// consumed by VM device attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDevice {
    /// Device numbers and mount point.
    pub device: Device,
    /// Whether the device is device-mapper backed.
    pub device_mapper: bool,
}

/// Resolves the device backing `path` and classifies it with `probe`.
///
/// # Errors
///
/// Propagates resolution errors from [`get_device_for_path`] and probe
/// failures unchanged.
pub fn resolve_block_device<P>(path: &Path, probe: &P) -> Result<BlockDevice>
where
    P: DeviceMapperProbe + ?Sized,
{
    let device = get_device_for_path(path)?;
    let device_mapper = probe.is_device_mapper(device.major, device.minor)?;
    tracing::debug!(
        path = %path.display(),
        device = %device.number(),
        device_mapper,
        "classified block device"
    );
    Ok(BlockDevice {
        device,
        device_mapper,
    })
}
