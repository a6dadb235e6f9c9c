//! System-wide constants and default paths.

/// Default root of the host-guest shared directory tree.
pub const DEFAULT_SHARED_DIR: &str = "/run/vmshare/shared/sandboxes";

/// Live mount table.
pub const PROC_MOUNTS_FILE: &str = "/proc/mounts";

/// Number of whitespace-separated fields on every mount table line.
pub const MOUNT_TABLE_FIELDS: usize = 6;

/// Sysfs directory holding one `<major>:<minor>` entry per block device.
pub const SYSFS_BLOCK_DIR: &str = "/sys/dev/block";

/// Entry present under a block device's sysfs node only for device-mapper devices.
pub const DEVICE_MAPPER_ENTRY: &str = "dm";

/// Name of the per-container directory that receives the shared rootfs.
pub const ROOTFS_DIR: &str = "rootfs";

/// Permission bits for directories and files created as mount destinations.
pub const MOUNT_PERM: u32 = 0o755;

/// Pseudo-filesystem roots that are never shared with the guest.
pub const SYSTEM_MOUNT_PREFIXES: &[&str] = &["/proc", "/sys"];

/// Binary name for the CLI.
pub const BIN_NAME: &str = "vmshare";
