// SPDX-License-Identifier: GPL-3.0-only

use crate::traits::BlockDevice;

/// Driver result: `0` on success, otherwise an errno-style code of either sign.
pub type DriverStatus = i32;

/// Operations shared by every filesystem driver
pub trait FilesystemDriver {
    fn mount(&mut self, device: &mut dyn BlockDevice) -> DriverStatus;

    fn unmount(&mut self) -> DriverStatus;
}

/// FAT driver. Reformat leaves the new volume mounted.
pub trait FatDriver: FilesystemDriver {
    /// `allocation_unit` of `0` selects the driver default cluster size.
    fn reformat(&mut self, device: &mut dyn BlockDevice, allocation_unit: u32) -> DriverStatus;
}

/// LittleFS driver. Reformat leaves the new volume mounted.
pub trait LittleFsDriver: FilesystemDriver {
    fn reformat(&mut self, device: &mut dyn BlockDevice) -> DriverStatus;
}
