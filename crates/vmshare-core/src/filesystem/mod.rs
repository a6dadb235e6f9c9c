//! Filesystem plumbing for sharing container root filesystems.
//!
//! Provides mount table lookups, the bind-mount sequence, and the
//! shared-directory layout used to expose rootfs trees to the guest.

pub mod mount;
pub mod mount_table;
pub mod rootfs;

pub use mount::{bind_container_mount, bind_mount, detach_unmount};
pub use mount_table::{MountEntry, MountTable, get_device_path_and_fs_type};
pub use rootfs::{
    ContainerRootfs, SandboxRootfs, TeardownFailure, TeardownReport, TeardownStage,
    bind_mount_container_rootfs, bind_unmount_all_rootfs, bind_unmount_container_rootfs,
    rootfs_destination,
};
