//! CLI command definitions and dispatch.

pub mod bind;
pub mod device;
pub mod mount_entry;
pub mod unbind;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use vmshare_common::config::VmshareConfig;

/// vmshare: block device resolution and rootfs sharing for VM containers.
#[derive(Parser, Debug)]
#[command(name = vmshare_common::constants::BIN_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Path to a JSON configuration file.
    #[arg(long, global = true, env = "VMSHARE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Root of the host-guest shared directory (overrides the config file).
    #[arg(long, global = true)]
    pub shared_dir: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub json_logs: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the block device backing a path.
    Device(device::DeviceArgs),
    /// Show the mount table entry for a mount point.
    MountEntry(mount_entry::MountEntryArgs),
    /// Share a container rootfs with the guest.
    Bind(bind::BindArgs),
    /// Stop sharing a container rootfs.
    Unbind(unbind::UnbindArgs),
}

impl Cli {
    /// Builds the effective configuration from the config file and flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be loaded or the
    /// result is invalid.
    pub fn resolve_config(&self) -> anyhow::Result<VmshareConfig> {
        let mut config = match &self.config {
            Some(path) => VmshareConfig::load(path)?,
            None => VmshareConfig::default(),
        };
        if let Some(shared_dir) = &self.shared_dir {
            config.shared_dir.clone_from(shared_dir);
        }
        config.validate()?;
        tracing::debug!(?config, "effective configuration");
        Ok(config)
    }
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = cli.resolve_config()?;
    match cli.command {
        Command::Device(args) => device::execute(&config, &args),
        Command::MountEntry(args) => mount_entry::execute(&config, &args),
        Command::Bind(args) => bind::execute(&config, &args),
        Command::Unbind(args) => unbind::execute(&config, &args),
    }
}
