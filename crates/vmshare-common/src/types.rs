//! Domain primitive types used across the vmshare workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Describes a container mount.
///
/// Owned by the container; the bind-mount code only reads `source`,
/// `destination` and `read_only`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mount {
    /// Host path being mounted.
    pub source: String,
    /// Path inside the container.
    pub destination: String,
    /// Filesystem type.
    #[serde(rename = "type")]
    pub fs_type: String,
    /// Mount options, in order.
    pub options: Vec<String>,
    /// Host side bind mount path.
    pub host_path: String,
    /// Whether the mount is read-only.
    pub read_only: bool,
    /// Block device attached to the VM when this mount is a block device
    /// file or a directory backed by one.
    pub block_device_id: String,
}

/// Major/minor pair identifying a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceNumber {
    /// Driver class.
    pub major: u32,
    /// Driver instance.
    pub minor: u32,
}

impl DeviceNumber {
    /// Decodes a raw `dev_t` using the fixed 12-bit major / 20-bit minor layout.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_raw(dev: u64) -> Self {
        Self {
            major: ((dev >> 8) & 0xfff) as u32,
            minor: ((dev & 0xff) | ((dev >> 12) & 0xfff00)) as u32,
        }
    }
}

impl fmt::Display for DeviceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.major, self.minor)
    }
}
