//! Integration tests for device resolution and rootfs sharing.
//!
//! Tests that perform real mounts need `CAP_SYS_ADMIN` and are ignored by
//! default. Run them as root with `cargo test -- --ignored`.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use vmshare_common::error::VmshareError;
use vmshare_core::device::{SysfsDeviceMapperProbe, get_device_for_path, resolve_block_device};
use vmshare_core::filesystem::{
    MountTable, bind_mount, bind_mount_container_rootfs, bind_unmount_container_rootfs,
    detach_unmount, rootfs_destination,
};

fn canonical_tempdir() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().canonicalize().expect("canonicalize");
    (dir, path)
}

fn is_mounted(path: &Path) -> bool {
    MountTable::default().find(path).is_ok()
}

// ── Device resolution ────────────────────────────────────────────────

#[test]
fn resolved_mount_point_is_listed_in_the_mount_table() {
    let device = get_device_for_path(Path::new("/proc/version")).expect("resolve");
    let entry = MountTable::default()
        .find(&device.mount_point)
        .expect("mount point listed");
    assert_eq!(entry.fs_type, "proc");
}

#[test]
fn pseudo_filesystems_are_not_device_mapper() {
    let block = resolve_block_device(Path::new("/proc"), &SysfsDeviceMapperProbe::default())
        .expect("resolve /proc");
    assert!(!block.device_mapper);
}

// ── Argument validation ──────────────────────────────────────────────

#[test]
fn bind_mount_rejects_empty_paths() {
    let (_dir, root) = canonical_tempdir();
    assert!(matches!(
        bind_mount(Path::new(""), &root.join("dest"), false),
        Err(VmshareError::InvalidArgument { .. })
    ));
    assert!(matches!(
        bind_mount(&root, Path::new(""), false),
        Err(VmshareError::InvalidArgument { .. })
    ));
    assert!(!root.join("dest").exists());
}

// ── Real mounts ──────────────────────────────────────────────────────

#[test]
#[ignore = "requires CAP_SYS_ADMIN"]
fn container_rootfs_round_trip_leaves_no_mount() {
    let (_dir, root) = canonical_tempdir();
    let rootfs = root.join("bundle").join("rootfs");
    std::fs::create_dir_all(rootfs.join("etc")).expect("mkdir");
    std::fs::write(rootfs.join("etc").join("hostname"), b"guest\n").expect("write");
    let shared = root.join("shared");

    bind_mount_container_rootfs(&shared, "sbx1", "c1", &rootfs, false).expect("bind");
    let destination = rootfs_destination(&shared, "sbx1", "c1");
    assert!(is_mounted(&destination));
    assert_eq!(
        std::fs::read(destination.join("etc").join("hostname")).expect("read through bind"),
        b"guest\n"
    );

    bind_unmount_container_rootfs(&shared, "sbx1", "c1").expect("unbind");
    assert!(!is_mounted(&destination));
}

#[test]
#[ignore = "requires CAP_SYS_ADMIN"]
fn readonly_bind_rejects_writes() {
    let (_dir, root) = canonical_tempdir();
    let source = root.join("source");
    std::fs::create_dir(&source).expect("mkdir");
    let destination = root.join("ro");

    bind_mount(&source, &destination, true).expect("bind");
    let err = std::fs::write(destination.join("file"), b"x").expect_err("read-only");
    assert_eq!(err.raw_os_error(), Some(libc::EROFS));
    // The source itself stays writable.
    std::fs::write(source.join("file"), b"x").expect("write source");

    detach_unmount(&destination).expect("unmount");
}

#[test]
#[ignore = "requires CAP_SYS_ADMIN"]
fn file_sources_are_bound_onto_files() {
    let (_dir, root) = canonical_tempdir();
    let source = root.join("hosts");
    std::fs::write(&source, b"127.0.0.1 localhost\n").expect("write");
    let link = root.join("hosts-link");
    std::os::unix::fs::symlink(&source, &link).expect("symlink");
    let destination = root.join("shared").join("hosts");

    bind_mount(&link, &destination, false).expect("bind through symlink");
    assert!(destination.is_file());
    assert_eq!(
        std::fs::read(&destination).expect("read"),
        b"127.0.0.1 localhost\n"
    );

    detach_unmount(&destination).expect("unmount");
}
