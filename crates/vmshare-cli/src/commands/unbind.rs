//! `vmshare unbind`: Stop sharing a container rootfs.

use clap::Args;
use vmshare_common::config::VmshareConfig;
use vmshare_core::filesystem::bind_unmount_container_rootfs;

/// Arguments for the `unbind` command.
#[derive(Args, Debug)]
pub struct UnbindArgs {
    /// Sandbox identifier.
    #[arg(long)]
    pub sandbox: String,

    /// Container identifier.
    #[arg(long)]
    pub container: String,
}

/// Executes the `unbind` command.
///
/// # Errors
///
/// Returns an error if the detach unmount fails.
pub fn execute(config: &VmshareConfig, args: &UnbindArgs) -> anyhow::Result<()> {
    bind_unmount_container_rootfs(&config.shared_dir, &args.sandbox, &args.container)?;
    tracing::info!(sandbox = %args.sandbox, container = %args.container, "rootfs unshared");
    Ok(())
}
