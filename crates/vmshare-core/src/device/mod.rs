//! Block device identification.
//!
//! Answers "which device backs this path, and where is its mount boundary"
//! for paths that are about to be handed to a virtual machine, and whether
//! that device is device-mapper backed.

pub mod mapper;
pub mod resolver;

use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use nix::sys::stat::SFlag;
use vmshare_common::constants::SYSTEM_MOUNT_PREFIXES;
use vmshare_common::types::DeviceNumber;

pub use mapper::{
    BlockDevice, DeviceMapperProbe, SysfsDeviceMapperProbe, is_device_mapper, resolve_block_device,
};
pub use resolver::get_device_for_path;

/// Block device backing a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// Major number of the device.
    pub major: u32,
    /// Minor number of the device.
    pub minor: u32,
    /// Mount point of the device. Empty when the resolved path is itself a
    /// host device node.
    pub mount_point: PathBuf,
}

impl Device {
    /// Returns the major/minor pair.
    #[must_use]
    pub const fn number(&self) -> DeviceNumber {
        DeviceNumber {
            major: self.major,
            minor: self.minor,
        }
    }

    /// Whether this device was resolved from a device node rather than a
    /// path on a mounted filesystem.
    #[must_use]
    pub fn is_device_node(&self) -> bool {
        self.mount_point.as_os_str().is_empty()
    }
}

/// Decodes a raw device identifier into `(major, minor)`.
#[must_use]
pub const fn decode_major_minor(dev: u64) -> (u32, u32) {
    let number = DeviceNumber::from_raw(dev);
    (number.major, number.minor)
}

/// Returns true if `path` is `/dev` or a non-regular file below it.
///
/// "Below" is a literal `/dev/` prefix on the path as given, so `//dev/null`
/// does not qualify. A path below `/dev` that cannot be stat-ed is reported
/// as not a host device; the caller's own stat surfaces the real error.
#[must_use]
pub fn is_host_device(path: &Path) -> bool {
    if path == Path::new("/dev") {
        return true;
    }
    if !path.as_os_str().as_bytes().starts_with(b"/dev/") {
        return false;
    }
    nix::sys::stat::stat(path).is_ok_and(|st| !is_regular_file(st.st_mode))
}

/// Returns true if `path` is `/proc`, `/sys`, or anything below them.
#[must_use]
pub fn is_system_mount(path: &Path) -> bool {
    SYSTEM_MOUNT_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
}

fn is_regular_file(mode: nix::libc::mode_t) -> bool {
    SFlag::from_bits_truncate(mode & SFlag::S_IFMT.bits()) == SFlag::S_IFREG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_itself_is_a_host_device() {
        assert!(is_host_device(Path::new("/dev")));
        assert!(is_host_device(Path::new("/dev/")));
    }

    #[test]
    fn device_nodes_are_host_devices() {
        assert!(is_host_device(Path::new("/dev/null")));
    }

    #[test]
    fn missing_dev_entries_are_not_host_devices() {
        assert!(!is_host_device(Path::new("/dev/definitely-not-a-device-node")));
    }

    #[test]
    fn paths_outside_dev_are_not_host_devices() {
        assert!(!is_host_device(Path::new("/devices/null")));
        assert!(!is_host_device(Path::new("/tmp")));
    }

    #[test]
    fn host_device_prefix_is_literal() {
        assert!(!is_host_device(Path::new("//dev/null")));
        assert!(!is_host_device(Path::new("dev/null")));
        assert!(is_host_device(Path::new("/dev/./null")));
    }

    #[test]
    fn system_mounts_match_whole_components() {
        assert!(is_system_mount(Path::new("/proc")));
        assert!(is_system_mount(Path::new("/sys/fs/cgroup")));
        assert!(!is_system_mount(Path::new("/process")));
        assert!(!is_system_mount(Path::new("/var/sys")));
    }

    #[test]
    fn decode_uses_legacy_layout() {
        assert_eq!(decode_major_minor(0x0103), (1, 3));
        assert_eq!(decode_major_minor((0x1 << 20) | (253 << 8) | 0x02), (253, 0x102));
    }

    #[test]
    fn device_node_has_no_mount_point() {
        let dev = Device {
            major: 1,
            minor: 3,
            mount_point: PathBuf::new(),
        };
        assert!(dev.is_device_node());
        assert_eq!(dev.number().to_string(), "1:3");
    }
}
