//! Mount point resolution by walking device boundaries.

use std::path::{Component, Path, PathBuf};

use nix::sys::stat::FileStat;
use vmshare_common::error::{Result, VmshareError};
use vmshare_common::types::DeviceNumber;

use super::{Device, is_host_device};

/// Returns the device containing `path` and the mount point of that device.
///
/// If `/dev/sda1` is mounted on `/a/b/c`, resolving `/a/b/c/file` yields
/// the numbers of `/dev/sda1` with mount point `/a/b/c`. Resolving a device
/// node such as `/dev/sda1` itself yields the node's own numbers and an
/// empty mount point.
///
/// # Errors
///
/// - [`VmshareError::InvalidArgument`] if `path` is empty.
/// - [`VmshareError::Stat`] if `path` or one of its parents cannot be stat-ed.
/// - [`VmshareError::MountPointNotFound`] if every parent up to `/` sits on
///   the same device as `path`.
pub fn get_device_for_path(path: &Path) -> Result<Device> {
    if path.as_os_str().is_empty() {
        return Err(VmshareError::InvalidArgument { name: "path" });
    }

    let st = stat_with(path, nix::sys::stat::stat::<Path>)?;

    if is_host_device(path) {
        let number = DeviceNumber::from_raw(u64::from(st.st_rdev));
        tracing::debug!(path = %path.display(), device = %number, "resolved host device node");
        return Ok(Device {
            major: number.major,
            minor: number.minor,
            mount_point: PathBuf::new(),
        });
    }

    let number = DeviceNumber::from_raw(u64::from(st.st_dev));
    let abs = absolute_path(path)?;

    let mount_point = if abs == Path::new("/") {
        abs
    } else {
        find_mount_point(&abs, st.st_dev)?
    };

    tracing::debug!(
        path = %path.display(),
        device = %number,
        mount_point = %mount_point.display(),
        "resolved device for path"
    );
    Ok(Device {
        major: number.major,
        minor: number.minor,
        mount_point,
    })
}

/// Walks up from `path` until the parent lives on a different device.
///
/// Parents are inspected with `lstat` so a symlinked or bind-mounted parent
/// is judged as the host sees the entry itself.
fn find_mount_point(path: &Path, dev: nix::libc::dev_t) -> Result<PathBuf> {
    let mut mount_point = path;
    for parent in path.ancestors().skip(1) {
        let parent_stat = stat_with(parent, nix::sys::stat::lstat::<Path>)?;
        if parent_stat.st_dev != dev {
            return Ok(mount_point.to_path_buf());
        }
        mount_point = parent;
    }
    Err(VmshareError::MountPointNotFound {
        path: path.to_path_buf(),
    })
}

fn stat_with(path: &Path, f: fn(&Path) -> nix::Result<FileStat>) -> Result<FileStat> {
    f(path).map_err(|e| VmshareError::Stat {
        path: path.to_path_buf(),
        source: e.into(),
    })
}

/// Makes `path` absolute against the working directory and removes `.` and
/// `..` components lexically, without following symlinks.
fn absolute_path(path: &Path) -> Result<PathBuf> {
    let abs = std::path::absolute(path).map_err(|e| VmshareError::Stat {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut clean = PathBuf::new();
    for component in abs.components() {
        match component {
            Component::ParentDir => {
                let _ = clean.pop();
            }
            Component::CurDir => {}
            other => clean.push(other),
        }
    }
    Ok(clean)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev_of(path: &Path) -> nix::libc::dev_t {
        nix::sys::stat::stat(path).expect("stat").st_dev
    }

    #[test]
    fn empty_path_is_rejected() {
        assert!(matches!(
            get_device_for_path(Path::new("")),
            Err(VmshareError::InvalidArgument { name: "path" })
        ));
    }

    #[test]
    fn root_is_its_own_mount_point() {
        let dev = get_device_for_path(Path::new("/")).expect("resolve /");
        assert_eq!(dev.mount_point, PathBuf::from("/"));
        assert_eq!(
            dev.number(),
            DeviceNumber::from_raw(u64::from(dev_of(Path::new("/"))))
        );
    }

    #[test]
    fn missing_path_is_a_stat_failure() {
        let err = get_device_for_path(Path::new("/no/such/path/for/vmshare")).expect_err("missing");
        assert!(matches!(err, VmshareError::Stat { .. }));
    }

    #[test]
    fn device_nodes_report_their_own_numbers() {
        let dev = get_device_for_path(Path::new("/dev/null")).expect("resolve /dev/null");
        assert!(dev.is_device_node());
        assert_eq!((dev.major, dev.minor), (1, 3));
    }

    #[test]
    fn proc_files_resolve_to_the_proc_mount() {
        let dev = get_device_for_path(Path::new("/proc/version")).expect("resolve");
        assert_eq!(dev.mount_point, PathBuf::from("/proc"));
        assert_eq!(
            dev.number(),
            DeviceNumber::from_raw(u64::from(dev_of(Path::new("/proc"))))
        );
    }

    #[test]
    fn regular_files_resolve_to_an_ancestor_on_the_same_device() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).expect("mkdir");
        let file = nested.join("file");
        std::fs::write(&file, b"data").expect("write");

        match get_device_for_path(&file) {
            Ok(dev) => {
                assert!(file.starts_with(&dev.mount_point));
                assert_eq!(
                    dev.number(),
                    DeviceNumber::from_raw(u64::from(dev_of(&dev.mount_point)))
                );
                assert_eq!(
                    dev.number(),
                    DeviceNumber::from_raw(u64::from(dev_of(&file)))
                );
            }
            // Only possible when the temp dir sits on the root filesystem.
            Err(e) => {
                assert!(
                    matches!(e, VmshareError::MountPointNotFound { .. }),
                    "unexpected error: {e}"
                );
                assert_eq!(dev_of(&file), dev_of(Path::new("/")));
            }
        }
    }

    #[test]
    fn absolute_path_cleans_dot_components() {
        assert_eq!(
            absolute_path(Path::new("/a/./b/../c")).expect("abs"),
            PathBuf::from("/a/c")
        );
        assert_eq!(absolute_path(Path::new("/..")).expect("abs"), PathBuf::from("/"));
    }

    #[test]
    fn relative_paths_are_anchored_at_the_working_directory() {
        let abs = absolute_path(Path::new("x/y")).expect("abs");
        assert!(abs.is_absolute());
        assert!(abs.ends_with("x/y"));
    }
}
