// SPDX-License-Identifier: GPL-3.0-only

//! Removable storage lifecycle core
//!
//! Binds block devices and filesystem drivers to the two fixed storage slots
//! (SD card and USB) of a controller board, and tears them down again without
//! leaking either object on any path.
//!
//! Two API layers are provided:
//! - [`StorageContext`]: typed operations returning [`StorageError`]
//! - [`PosixStorage`]: the same operations as `0`/`-1` returns plus an errno
//!   indicator, for code written against the POSIX storage calls
//!
//! ## Concurrency
//!
//! Every operation runs to completion on the caller's thread and may block
//! for the duration of the driver I/O. There is no timeout or cancellation.
//! Hot-plug callbacks run in the USB driver's own context; they must not call
//! back into the storage context. Wrap the context in a mutex before sharing
//! it between threads.

mod binder;
pub mod context;
mod hotplug;
mod orchestrator;
pub mod posix;
pub mod registry;

#[cfg(test)]
mod test_support;

pub use context::StorageContext;
pub use orchestrator::FormatOutcome;
pub use posix::PosixStorage;
pub use registry::{Disposal, Registry, SlotBinding, Volume};

pub use storage_contracts::{StorageError, StorageErrorKind};
pub use storage_types::{BoardVariant, FilesystemKind, MountFlags, PlatformConfig, Slot};
