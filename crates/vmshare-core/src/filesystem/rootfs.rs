//! Sharing container root filesystems with the guest.
//!
//! Each container rootfs is bind mounted at
//! `<shared_dir>/<sandbox_id>/<container_id>/rootfs`, which the host-guest
//! shared filesystem then serves to the VM. Containers backed by a
//! dedicated block device are attached to the VM directly and have no
//! such bind mount.

use std::path::{Path, PathBuf};

use vmshare_common::constants::ROOTFS_DIR;
use vmshare_common::error::{Result, VmshareError};

use super::mount::{bind_mount, detach_unmount};

/// Container as seen by rootfs teardown.
pub trait ContainerRootfs {
    /// Container identifier.
    fn id(&self) -> &str;

    /// Filesystem type of the container's rootfs block device, or an empty
    /// string when the rootfs is shared through a bind mount.
    fn fs_type(&self) -> &str;

    /// Releases the mounts the container tracks for itself.
    ///
    /// # Errors
    ///
    /// Returns the first failure encountered while releasing.
    fn unmount_host_mounts(&self) -> Result<()>;

    /// Whether the rootfs was bind mounted into the shared directory.
    fn is_rootfs_bind_mounted(&self) -> bool {
        self.fs_type().is_empty()
    }
}

/// Sandbox as seen by rootfs teardown.
pub trait SandboxRootfs {
    /// Container type held by the sandbox.
    type Container: ContainerRootfs;

    /// Sandbox identifier.
    fn id(&self) -> &str;

    /// All containers known to the sandbox.
    fn containers(&self) -> &[Self::Container];
}

/// Which part of a container's teardown failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownStage {
    /// Releasing the container's own host mounts.
    HostMounts,
    /// Detaching the shared rootfs bind mount.
    Rootfs,
}

/// A failure recorded during bulk teardown.
#[derive(Debug)]
pub struct TeardownFailure {
    /// Container whose teardown failed.
    pub container_id: String,
    /// Failing stage.
    pub stage: TeardownStage,
    /// Underlying error.
    pub error: VmshareError,
}

/// Outcome of [`bind_unmount_all_rootfs`].
#[derive(Debug, Default)]
pub struct TeardownReport {
    /// Containers whose shared rootfs was detached.
    pub unmounted: Vec<String>,
    /// Every failure, in container order.
    pub failures: Vec<TeardownFailure>,
}

impl TeardownReport {
    /// Returns true if no step failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Destination of a container's shared rootfs.
#[must_use]
pub fn rootfs_destination(shared_dir: &Path, sandbox_id: &str, container_id: &str) -> PathBuf {
    shared_dir.join(sandbox_id).join(container_id).join(ROOTFS_DIR)
}

/// Bind mounts `container_rootfs` into the shared directory of `sandbox_id`.
///
/// # Errors
///
/// Returns [`VmshareError::InvalidArgument`] for an identifier that is
/// empty, `.`, `..` or contains `/`, and otherwise any error from
/// [`bind_mount`].
pub fn bind_mount_container_rootfs(
    shared_dir: &Path,
    sandbox_id: &str,
    container_id: &str,
    container_rootfs: &Path,
    readonly: bool,
) -> Result<()> {
    check_ids(sandbox_id, container_id)?;
    let destination = rootfs_destination(shared_dir, sandbox_id, container_id);
    tracing::debug!(
        sandbox = sandbox_id,
        container = container_id,
        destination = %destination.display(),
        "sharing container rootfs"
    );
    bind_mount(container_rootfs, &destination, readonly)
}

/// Detaches a container's shared rootfs.
///
/// # Errors
///
/// Returns [`VmshareError::InvalidArgument`] for an identifier that is
/// empty, `.`, `..` or contains `/`, and [`VmshareError::Unmount`] if the
/// detach fails.
pub fn bind_unmount_container_rootfs(
    shared_dir: &Path,
    sandbox_id: &str,
    container_id: &str,
) -> Result<()> {
    check_ids(sandbox_id, container_id)?;
    detach_unmount(&rootfs_destination(shared_dir, sandbox_id, container_id))
}

/// Tears down the shared rootfs of every container in `sandbox`.
///
/// Each container first releases its own host mounts; its rootfs is then
/// detached if it was bind mounted. A failing container never stops the
/// remaining ones: all failures are logged and collected in the report.
pub fn bind_unmount_all_rootfs<S: SandboxRootfs>(shared_dir: &Path, sandbox: &S) -> TeardownReport {
    let mut report = TeardownReport::default();

    for container in sandbox.containers() {
        if let Err(error) = container.unmount_host_mounts() {
            tracing::warn!(
                sandbox = sandbox.id(),
                container = container.id(),
                %error,
                "could not release container host mounts"
            );
            report.failures.push(TeardownFailure {
                container_id: container.id().to_owned(),
                stage: TeardownStage::HostMounts,
                error,
            });
        }

        if !container.is_rootfs_bind_mounted() {
            continue;
        }

        match bind_unmount_container_rootfs(shared_dir, sandbox.id(), container.id()) {
            Ok(()) => report.unmounted.push(container.id().to_owned()),
            Err(error) => {
                tracing::warn!(
                    sandbox = sandbox.id(),
                    container = container.id(),
                    %error,
                    "could not detach container rootfs"
                );
                report.failures.push(TeardownFailure {
                    container_id: container.id().to_owned(),
                    stage: TeardownStage::Rootfs,
                    error,
                });
            }
        }
    }

    tracing::info!(
        sandbox = sandbox.id(),
        unmounted = report.unmounted.len(),
        failures = report.failures.len(),
        "sandbox rootfs teardown finished"
    );
    report
}

fn check_ids(sandbox_id: &str, container_id: &str) -> Result<()> {
    if !is_path_component(sandbox_id) {
        return Err(VmshareError::InvalidArgument { name: "sandbox id" });
    }
    if !is_path_component(container_id) {
        return Err(VmshareError::InvalidArgument {
            name: "container id",
        });
    }
    Ok(())
}

/// An identifier must name exactly one directory below its parent.
fn is_path_component(id: &str) -> bool {
    !id.is_empty() && id != "." && id != ".." && !id.contains('/')
}
