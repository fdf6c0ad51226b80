// SPDX-License-Identifier: GPL-3.0-only

//! POSIX-style storage calls
//!
//! Thin wrapper over [`StorageContext`] for callers written against integer
//! returns: every call yields `0` on success or `-1` on failure, with the
//! positive error code left in [`PosixStorage::errno`]. A successful call
//! never touches the error indicator.

use libc::c_int;
use storage_contracts::{BoardSupport, HotplugCallback, StorageError};
use storage_types::{FilesystemKind, MountFlags, PlatformConfig, Slot};

use crate::context::StorageContext;

pub struct PosixStorage<B: BoardSupport> {
    context: StorageContext<B>,
    errno: c_int,
}

impl<B: BoardSupport> PosixStorage<B> {
    pub fn new(board: B, config: PlatformConfig) -> Self {
        Self::from_context(StorageContext::new(board, config))
    }

    pub fn from_context(context: StorageContext<B>) -> Self {
        Self { context, errno: 0 }
    }

    /// Error code of the most recent failed call.
    pub fn errno(&self) -> c_int {
        self.errno
    }

    pub fn context(&self) -> &StorageContext<B> {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut StorageContext<B> {
        &mut self.context
    }

    pub fn into_inner(self) -> StorageContext<B> {
        self.context
    }

    pub fn mount(&mut self, slot: Slot, kind: FilesystemKind, flags: MountFlags) -> c_int {
        let result = self.context.mount(slot, kind, flags);
        self.status(result)
    }

    pub fn mkfs(&mut self, slot: Slot, kind: FilesystemKind) -> c_int {
        let result = self.context.format(slot, kind).map(|_| ());
        self.status(result)
    }

    pub fn umount(&mut self, slot: Slot) -> c_int {
        let result = self.context.unmount(slot).map(|_| ());
        self.status(result)
    }

    pub fn register_hotplug_callback(
        &mut self,
        slot: Slot,
        callback: Option<HotplugCallback>,
    ) -> c_int {
        let result = self.context.register_hotplug_callback(slot, callback);
        self.status(result)
    }

    pub fn deregister_hotplug_callback(&mut self, slot: Slot) -> c_int {
        let result = self.context.deregister_hotplug_callback(slot);
        self.status(result)
    }

    fn status(&mut self, result: Result<(), StorageError>) -> c_int {
        match result {
            Ok(()) => 0,
            Err(error) => {
                tracing::debug!("Storage call failed: {}", error);
                self.errno = error.errno();
                -1
            }
        }
    }
}
