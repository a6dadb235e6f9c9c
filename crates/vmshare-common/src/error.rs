//! Unified error types for the vmshare workspace.
//!
//! Every failure carries the path or argument it concerns so callers can log
//! it without extra context. Syscall failures are stored as [`std::io::Error`]
//! regardless of which wrapper crate issued the call.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// One step of the bind-mount sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MountStep {
    /// Initial `MS_BIND` of the source onto the destination.
    Bind,
    /// Switching the destination to private propagation.
    MakePrivate,
    /// `MS_BIND | MS_REMOUNT | MS_RDONLY` remount.
    RemountReadOnly,
}

impl fmt::Display for MountStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind => write!(f, "bind"),
            Self::MakePrivate => write!(f, "make-private"),
            Self::RemountReadOnly => write!(f, "read-only remount"),
        }
    }
}

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum VmshareError {
    /// A required string argument was empty.
    #[error("invalid argument: {name} must not be empty")]
    InvalidArgument {
        /// Name of the offending argument.
        name: &'static str,
    },

    /// Filesystem metadata could not be obtained.
    #[error("stat failed for {path}: {source}")]
    Stat {
        /// Path that was being inspected.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The bind source could not be resolved through its symlinks.
    #[error("could not resolve bind source {path}: {source}")]
    SourceResolution {
        /// Source path as given by the caller.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The bind destination could not be created.
    #[error("could not create mount destination {path}: {source}")]
    DestinationCreation {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The upward walk reached `/` without crossing a device boundary.
    #[error("mount point not found for {path}")]
    MountPointNotFound {
        /// Absolute path whose mount point was searched.
        path: PathBuf,
    },

    /// A mount table line did not have the expected number of fields.
    #[error("malformed mount table line (expected {expected} fields, got {found}): {line}")]
    MalformedMountTable {
        /// Required field count.
        expected: usize,
        /// Field count actually present.
        found: usize,
        /// The offending line.
        line: String,
    },

    /// No mount table line matched the requested mount point.
    #[error("mount {mount_point} not found")]
    MountEntryNotFound {
        /// Mount point that was looked up.
        mount_point: String,
    },

    /// The mount table itself could not be opened or read.
    #[error("could not read mount table {path}: {source}")]
    MountTable {
        /// Mount table path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The sysfs device-mapper check failed for a reason other than absence.
    #[error("device-mapper check failed at {path}: {source}")]
    DeviceMapperProbe {
        /// Sysfs path that was checked.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// One step of the bind-mount sequence failed.
    #[error("{step} of {from} onto {destination} failed: {source}")]
    Mount {
        /// The failing step.
        step: MountStep,
        /// Resolved bind source.
        from: PathBuf,
        /// Mount destination.
        destination: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A detach unmount failed.
    #[error("could not unmount {path}: {source}")]
    Unmount {
        /// Mount point that was being detached.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, VmshareError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mount_error_names_the_failing_step() {
        let err = VmshareError::Mount {
            step: MountStep::MakePrivate,
            from: PathBuf::from("/src"),
            destination: PathBuf::from("/dst"),
            source: std::io::Error::from_raw_os_error(1),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("make-private of /src onto /dst failed"), "{msg}");
    }

    #[test]
    fn entry_not_found_names_the_mount_point() {
        let err = VmshareError::MountEntryNotFound {
            mount_point: "/mnt/data".into(),
        };
        assert_eq!(err.to_string(), "mount /mnt/data not found");
    }
}
