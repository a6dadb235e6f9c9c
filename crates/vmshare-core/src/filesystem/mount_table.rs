//! Lookups in the live mount table (`/proc/mounts`).

use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use vmshare_common::constants::{MOUNT_TABLE_FIELDS, PROC_MOUNTS_FILE};
use vmshare_common::error::{Result, VmshareError};

const DEVICE_INDEX: usize = 0;
const PATH_INDEX: usize = 1;
const TYPE_INDEX: usize = 2;

/// One mount table record. Options, dump frequency and pass number are
/// not retained.
///
/// Mount paths are raw bytes and kept as such. Device path and filesystem
/// type are decoded lossily.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    /// Backing device path (first field).
    pub device_path: String,
    /// Mount path (second field).
    pub mount_path: PathBuf,
    /// Filesystem type (third field).
    pub fs_type: String,
}

/// Reader over a mount table file.
#[derive(Debug, Clone)]
pub struct MountTable {
    path: PathBuf,
}

impl MountTable {
    /// Creates a reader over the table at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the underlying table.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the first entry whose mount path equals `mount_point` exactly.
    ///
    /// The table is read fresh on every call.
    ///
    /// # Errors
    ///
    /// - [`VmshareError::InvalidArgument`] if `mount_point` is empty.
    /// - [`VmshareError::MountTable`] if the table cannot be opened or read.
    /// - [`VmshareError::MalformedMountTable`] if a line scanned before the
    ///   match does not have exactly six fields.
    /// - [`VmshareError::MountEntryNotFound`] if no line matches.
    pub fn find(&self, mount_point: &Path) -> Result<MountEntry> {
        if mount_point.as_os_str().is_empty() {
            return Err(VmshareError::InvalidArgument {
                name: "mount point",
            });
        }
        let file = File::open(&self.path).map_err(|e| VmshareError::MountTable {
            path: self.path.clone(),
            source: e,
        })?;
        find_entry(BufReader::new(file), mount_point, &self.path)
    }

    /// Returns the device path and filesystem type mounted at `mount_point`.
    ///
    /// # Errors
    ///
    /// Same as [`MountTable::find`].
    pub fn device_path_and_fs_type(&self, mount_point: &Path) -> Result<(String, String)> {
        let entry = self.find(mount_point)?;
        Ok((entry.device_path, entry.fs_type))
    }
}

impl Default for MountTable {
    fn default() -> Self {
        Self::new(PROC_MOUNTS_FILE)
    }
}

/// Returns the device path and filesystem type mounted at `mount_point`
/// according to `/proc/mounts`.
///
/// # Errors
///
/// Same as [`MountTable::find`].
pub fn get_device_path_and_fs_type(mount_point: &Path) -> Result<(String, String)> {
    MountTable::default().device_path_and_fs_type(mount_point)
}

fn find_entry<R: BufRead>(mut reader: R, mount_point: &Path, table: &Path) -> Result<MountEntry> {
    let wanted = mount_point.as_os_str().as_bytes();
    let mut line = Vec::new();

    loop {
        line.clear();
        let read = reader
            .read_until(b'\n', &mut line)
            .map_err(|e| VmshareError::MountTable {
                path: table.to_path_buf(),
                source: e,
            })?;
        if read == 0 {
            break;
        }

        let fields: Vec<&[u8]> = line
            .split(u8::is_ascii_whitespace)
            .filter(|field| !field.is_empty())
            .collect();
        if fields.len() != MOUNT_TABLE_FIELDS {
            return Err(VmshareError::MalformedMountTable {
                expected: MOUNT_TABLE_FIELDS,
                found: fields.len(),
                line: String::from_utf8_lossy(line.trim_ascii_end()).into_owned(),
            });
        }
        if fields[PATH_INDEX] == wanted {
            let entry = MountEntry {
                device_path: String::from_utf8_lossy(fields[DEVICE_INDEX]).into_owned(),
                mount_path: PathBuf::from(OsStr::from_bytes(fields[PATH_INDEX])),
                fs_type: String::from_utf8_lossy(fields[TYPE_INDEX]).into_owned(),
            };
            tracing::debug!(
                mount_point = %mount_point.display(),
                device = %entry.device_path,
                fs_type = %entry.fs_type,
                "found mount table entry"
            );
            return Ok(entry);
        }
    }
    Err(VmshareError::MountEntryNotFound {
        mount_point: mount_point.display().to_string(),
    })
}
