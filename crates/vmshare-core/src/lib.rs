//! # vmshare-core
//!
//! Host-side storage primitives for running containers inside virtual
//! machines.
//!
//! This crate provides:
//! - **Device resolution**: which block device backs a path, where its
//!   mount boundary is, and whether it is device-mapper backed.
//! - **Mount table lookups**: device path and filesystem type of a mount.
//! - **Rootfs sharing**: bind mounting container root filesystems into the
//!   host-guest shared directory and tearing them down again.
//!
//! All operations are synchronous syscalls. Callers serialize concurrent
//! operations on the same destination.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod device;
pub mod filesystem;
