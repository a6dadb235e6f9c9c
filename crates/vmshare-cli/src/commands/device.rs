//! `vmshare device`: Show the block device backing a path.

use std::path::PathBuf;

use clap::Args;
use vmshare_common::config::VmshareConfig;
use vmshare_core::device::{SysfsDeviceMapperProbe, resolve_block_device};
use vmshare_core::filesystem::MountTable;

use crate::output::format_block_device;

/// Arguments for the `device` command.
#[derive(Args, Debug)]
pub struct DeviceArgs {
    /// Path to resolve.
    pub path: PathBuf,

    /// Also look up the device path and filesystem type in the mount table.
    #[arg(long)]
    pub mount_info: bool,
}

/// Executes the `device` command.
///
/// # Errors
///
/// Returns an error if the path cannot be resolved or classified.
pub fn execute(config: &VmshareConfig, args: &DeviceArgs) -> anyhow::Result<()> {
    let probe = SysfsDeviceMapperProbe::new(&config.sysfs_block_dir);
    let block = resolve_block_device(&args.path, &probe)?;
    println!("{}", format_block_device(&block));

    if args.mount_info && !block.device.is_device_node() {
        let entry = MountTable::new(&config.mount_table).find(&block.device.mount_point)?;
        println!("{:<14} {}", "DEVICE PATH", entry.device_path);
        println!("{:<14} {}", "FS TYPE", entry.fs_type);
    }
    Ok(())
}
