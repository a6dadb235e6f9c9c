//! `vmshare bind`: Share a container rootfs with the guest.

use std::path::PathBuf;

use clap::Args;
use vmshare_common::config::VmshareConfig;
use vmshare_core::filesystem::{bind_mount_container_rootfs, rootfs_destination};

/// Arguments for the `bind` command.
#[derive(Args, Debug)]
pub struct BindArgs {
    /// Sandbox identifier.
    #[arg(long)]
    pub sandbox: String,

    /// Container identifier.
    #[arg(long)]
    pub container: String,

    /// Container root filesystem on the host.
    #[arg(long)]
    pub rootfs: PathBuf,

    /// Share the rootfs read-only.
    #[arg(long)]
    pub readonly: bool,
}

/// Executes the `bind` command.
///
/// # Errors
///
/// Returns an error if any step of the bind mount fails.
pub fn execute(config: &VmshareConfig, args: &BindArgs) -> anyhow::Result<()> {
    bind_mount_container_rootfs(
        &config.shared_dir,
        &args.sandbox,
        &args.container,
        &args.rootfs,
        args.readonly,
    )?;
    println!(
        "{}",
        rootfs_destination(&config.shared_dir, &args.sandbox, &args.container).display()
    );
    Ok(())
}
