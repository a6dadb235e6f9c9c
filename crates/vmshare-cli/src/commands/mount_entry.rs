//! `vmshare mount-entry`: Show the mount table entry for a mount point.

use std::path::PathBuf;

use clap::Args;
use vmshare_common::config::VmshareConfig;
use vmshare_core::filesystem::MountTable;

/// Arguments for the `mount-entry` command.
#[derive(Args, Debug)]
pub struct MountEntryArgs {
    /// Mount point, exactly as listed in the mount table.
    pub mount_point: PathBuf,
}

/// Executes the `mount-entry` command.
///
/// # Errors
///
/// Returns an error if the mount table is unreadable or malformed, or has
/// no entry for the mount point.
pub fn execute(config: &VmshareConfig, args: &MountEntryArgs) -> anyhow::Result<()> {
    let (device_path, fs_type) =
        MountTable::new(&config.mount_table).device_path_and_fs_type(&args.mount_point)?;
    println!("{device_path} {fs_type}");
    Ok(())
}
