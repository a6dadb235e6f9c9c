//! Bind mounts into the shared directory tree.
//!
//! A bind is issued as up to three separate `mount(2)` calls: the bind
//! itself, a switch to private propagation, and an optional read-only
//! remount. Older util-linux/kernel combinations ignore `MS_RDONLY` when it
//! is passed together with `MS_BIND`, so read-only needs its own call.

use std::fs::{DirBuilder, OpenOptions};
use std::io;
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};
use std::path::Path;

use nix::mount::{MntFlags, MsFlags, mount, umount2};
use vmshare_common::constants::MOUNT_PERM;
use vmshare_common::error::{MountStep, Result, VmshareError};
use vmshare_common::types::Mount;

/// Bind mounts `source` onto `destination`.
///
/// `source` is resolved through all symlinks first. `destination` is
/// created if missing, as a directory when `source` is a directory and as
/// an empty file otherwise, with any missing parents created `0755`.
///
/// If a later step fails after the bind succeeded, the destination is
/// detached again before the error is returned.
///
/// # Errors
///
/// - [`VmshareError::InvalidArgument`] if either path is empty.
/// - [`VmshareError::SourceResolution`] if `source` cannot be resolved.
/// - [`VmshareError::DestinationCreation`] if `destination` cannot be created.
/// - [`VmshareError::Mount`] naming the failing step.
pub fn bind_mount(source: &Path, destination: &Path, readonly: bool) -> Result<()> {
    if source.as_os_str().is_empty() {
        return Err(VmshareError::InvalidArgument { name: "source" });
    }
    if destination.as_os_str().is_empty() {
        return Err(VmshareError::InvalidArgument {
            name: "destination",
        });
    }

    let abs_source = std::fs::canonicalize(source).map_err(|e| VmshareError::SourceResolution {
        path: source.to_path_buf(),
        source: e,
    })?;

    ensure_destination_exists(&abs_source, destination).map_err(|e| {
        VmshareError::DestinationCreation {
            path: destination.to_path_buf(),
            source: e,
        }
    })?;

    bind_steps(&Kernel, &abs_source, destination, readonly)?;
    tracing::info!(
        source = %abs_source.display(),
        destination = %destination.display(),
        readonly,
        "bind mount ready"
    );
    Ok(())
}

/// Bind mounts a container mount descriptor.
///
/// Only `source`, `destination` and `read_only` are read.
///
/// # Errors
///
/// Same as [`bind_mount`].
pub fn bind_container_mount(mount: &Mount) -> Result<()> {
    bind_mount(
        Path::new(&mount.source),
        Path::new(&mount.destination),
        mount.read_only,
    )
}

/// Lazily detaches the mount at `path` (`MNT_DETACH`).
///
/// Succeeds even if the mount is busy; the kernel releases it once the
/// last reference goes away.
///
/// # Errors
///
/// Returns [`VmshareError::Unmount`] if `umount2(2)` fails, for example
/// because nothing is mounted at `path`.
pub fn detach_unmount(path: &Path) -> Result<()> {
    Kernel.detach(path).map_err(|e| VmshareError::Unmount {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    tracing::info!(path = %path.display(), "bind mount detached");
    Ok(())
}

/// Creates `destination` with the same shape (file or directory) as `source`.
fn ensure_destination_exists(source: &Path, destination: &Path) -> io::Result<()> {
    let source_is_dir = std::fs::metadata(source)?.is_dir();

    if let Some(parent) = destination.parent() {
        DirBuilder::new()
            .recursive(true)
            .mode(MOUNT_PERM)
            .create(parent)?;
    }

    if source_is_dir {
        match DirBuilder::new().mode(MOUNT_PERM).create(destination) {
            Err(e) if e.kind() != io::ErrorKind::AlreadyExists => Err(e),
            _ => Ok(()),
        }
    } else {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .mode(MOUNT_PERM)
            .open(destination)
            .map(drop)
    }
}

fn mount_error(step: MountStep, from: &Path, destination: &Path, e: nix::Error) -> VmshareError {
    VmshareError::Mount {
        step,
        from: from.to_path_buf(),
        destination: destination.to_path_buf(),
        source: e.into(),
    }
}

/// The `mount(2)`/`umount2(2)` calls making up a bind.
trait MountOps {
    fn bind(&self, source: &Path, destination: &Path) -> nix::Result<()>;
    fn make_private(&self, destination: &Path) -> nix::Result<()>;
    fn remount_read_only(&self, source: &Path, destination: &Path) -> nix::Result<()>;
    fn detach(&self, path: &Path) -> nix::Result<()>;
}

/// Issues the real syscalls.
struct Kernel;

impl MountOps for Kernel {
    fn bind(&self, source: &Path, destination: &Path) -> nix::Result<()> {
        mount(
            Some(source),
            destination,
            Some("bind"),
            MsFlags::MS_BIND,
            None::<&str>,
        )
    }

    fn make_private(&self, destination: &Path) -> nix::Result<()> {
        mount(
            Some("none"),
            destination,
            None::<&str>,
            MsFlags::MS_PRIVATE,
            None::<&str>,
        )
    }

    fn remount_read_only(&self, source: &Path, destination: &Path) -> nix::Result<()> {
        mount(
            Some(source),
            destination,
            Some("bind"),
            MsFlags::MS_BIND | MsFlags::MS_REMOUNT | MsFlags::MS_RDONLY,
            None::<&str>,
        )
    }

    fn detach(&self, path: &Path) -> nix::Result<()> {
        umount2(path, MntFlags::MNT_DETACH)
    }
}

/// Runs the bind, make-private and optional read-only steps against an
/// existing destination. A bind left half configured is detached again.
fn bind_steps<O: MountOps>(ops: &O, source: &Path, destination: &Path, readonly: bool) -> Result<()> {
    ops.bind(source, destination)
        .map_err(|e| mount_error(MountStep::Bind, source, destination, e))?;
    tracing::debug!(
        source = %source.display(),
        destination = %destination.display(),
        "bind mounted"
    );

    if let Err(e) = ops.make_private(destination) {
        return Err(abort_partial_mount(ops, MountStep::MakePrivate, source, destination, e));
    }

    if readonly {
        if let Err(e) = ops.remount_read_only(source, destination) {
            return Err(abort_partial_mount(
                ops,
                MountStep::RemountReadOnly,
                source,
                destination,
                e,
            ));
        }
        tracing::debug!(destination = %destination.display(), "remounted read-only");
    }
    Ok(())
}

/// Detaches a bind whose follow-up step failed and builds the step error.
fn abort_partial_mount<O: MountOps>(
    ops: &O,
    step: MountStep,
    from: &Path,
    destination: &Path,
    e: nix::Error,
) -> VmshareError {
    if let Err(cleanup) = ops.detach(destination) {
        tracing::warn!(
            destination = %destination.display(),
            error = %cleanup,
            "could not detach partially configured bind mount"
        );
    }
    mount_error(step, from, destination, e)
}
