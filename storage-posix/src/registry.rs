// SPDX-License-Identifier: GPL-3.0-only

//! Resource pair registry
//!
//! Each slot owns at most one block device and, while mounted, one volume.
//! A volume never outlives its device: dropping the device always drops the
//! volume first.

use storage_contracts::{
    BlockDevice, BoardSupport, DriverStatus, FatDriver, FilesystemDriver, LittleFsDriver,
};
use storage_types::{FilesystemKind, Slot};

/// Allocation unit passed to FAT reformat; zero selects the driver default.
pub const DEFAULT_FAT_ALLOCATION_UNIT: u32 = 0;

/// Filesystem driver bound to a slot, tagged by on-disk format
pub enum Volume<B: BoardSupport> {
    Fat(B::Fat),
    LittleFs(B::LittleFs),
}

impl<B: BoardSupport> Volume<B> {
    pub(crate) fn create(board: &mut B, kind: FilesystemKind, mount_point: &str) -> Option<Self> {
        match kind {
            FilesystemKind::Fat => board.new_fat(mount_point).map(Self::Fat),
            FilesystemKind::LittleFs => board.new_littlefs(mount_point).map(Self::LittleFs),
        }
    }

    pub fn kind(&self) -> FilesystemKind {
        match self {
            Self::Fat(_) => FilesystemKind::Fat,
            Self::LittleFs(_) => FilesystemKind::LittleFs,
        }
    }

    pub(crate) fn mount(&mut self, device: &mut dyn BlockDevice) -> DriverStatus {
        match self {
            Self::Fat(fs) => fs.mount(device),
            Self::LittleFs(fs) => fs.mount(device),
        }
    }

    pub(crate) fn unmount(&mut self) -> DriverStatus {
        match self {
            Self::Fat(fs) => fs.unmount(),
            Self::LittleFs(fs) => fs.unmount(),
        }
    }

    pub(crate) fn reformat(&mut self, device: &mut dyn BlockDevice) -> DriverStatus {
        match self {
            Self::Fat(fs) => FatDriver::reformat(fs, device, DEFAULT_FAT_ALLOCATION_UNIT),
            Self::LittleFs(fs) => LittleFsDriver::reformat(fs, device),
        }
    }
}

/// What happened to a slot's device after its volume went away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposal {
    /// Device dropped, slot empty
    Released,
    /// Device kept in the slot and reused by the next mount
    Retained,
}

/// Device and volume currently bound to one slot
pub struct SlotBinding<D, B: BoardSupport> {
    pub(crate) device: Option<D>,
    pub(crate) volume: Option<Volume<B>>,
}

impl<D, B: BoardSupport> Default for SlotBinding<D, B> {
    fn default() -> Self {
        Self {
            device: None,
            volume: None,
        }
    }
}

impl<D, B: BoardSupport> SlotBinding<D, B> {
    pub fn has_device(&self) -> bool {
        self.device.is_some()
    }

    pub fn is_mounted(&self) -> bool {
        self.volume.is_some()
    }

    pub fn volume_kind(&self) -> Option<FilesystemKind> {
        self.volume.as_ref().map(Volume::kind)
    }

    /// Drop the device unless the platform forbids tearing it down.
    pub(crate) fn dispose_device(&mut self, teardown_allowed: bool) -> Disposal {
        self.volume = None;
        if teardown_allowed {
            self.device = None;
            Disposal::Released
        } else {
            Disposal::Retained
        }
    }
}

/// Bindings for both slots
pub struct Registry<B: BoardSupport> {
    pub(crate) sd: SlotBinding<B::SdDevice, B>,
    pub(crate) usb: SlotBinding<B::UsbDevice, B>,
}

impl<B: BoardSupport> Default for Registry<B> {
    fn default() -> Self {
        Self {
            sd: SlotBinding::default(),
            usb: SlotBinding::default(),
        }
    }
}

impl<B: BoardSupport> Registry<B> {
    pub fn sd(&self) -> &SlotBinding<B::SdDevice, B> {
        &self.sd
    }

    pub fn usb(&self) -> &SlotBinding<B::UsbDevice, B> {
        &self.usb
    }

    pub fn has_device(&self, slot: Slot) -> bool {
        match slot {
            Slot::SdCard => self.sd.has_device(),
            Slot::Usb => self.usb.has_device(),
        }
    }

    pub fn is_mounted(&self, slot: Slot) -> bool {
        match slot {
            Slot::SdCard => self.sd.is_mounted(),
            Slot::Usb => self.usb.is_mounted(),
        }
    }

    pub fn volume_kind(&self, slot: Slot) -> Option<FilesystemKind> {
        match slot {
            Slot::SdCard => self.sd.volume_kind(),
            Slot::Usb => self.usb.volume_kind(),
        }
    }
}
