// SPDX-License-Identifier: GPL-3.0-only

//! Canonical domain types for the removable storage lifecycle core
//!
//! These types are shared by every layer of the stack:
//!
//! - **storage-sys**: board probing and driver status translation
//! - **storage-posix**: the binding state machine and its public API
//! - **storage-testing**: simulated drivers and lab scenarios
//!
//! Everything here is plain data. Behaviour lives in the crates above.

pub mod board;
pub mod filesystem;
pub mod platform;
pub mod slot;

pub use board::{BoardOverride, BoardVariant};
pub use filesystem::{Action, FilesystemKind, MountFlags};
pub use platform::{Capability, PlatformConfig, UsbHostClass};
pub use slot::Slot;
