//! Formatted output helpers for CLI commands.

use vmshare_core::device::BlockDevice;

/// Formats a classified block device as aligned `KEY value` lines.
#[must_use]
pub fn format_block_device(block: &BlockDevice) -> String {
    let mount_point = if block.device.is_device_node() {
        "-".to_string()
    } else {
        block.device.mount_point.display().to_string()
    };
    format!(
        "{:<14} {}\n{:<14} {}\n{:<14} {}",
        "DEVICE",
        block.device.number(),
        "MOUNT POINT",
        mount_point,
        "DEVICE MAPPER",
        if block.device_mapper { "yes" } else { "no" },
    )
}
