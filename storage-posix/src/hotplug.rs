// SPDX-License-Identifier: GPL-3.0-only

//! USB insertion callback registration

use storage_contracts::{
    BoardSupport, HotplugCallback, StorageError, StorageErrorKind, UsbHostDevice,
};
use storage_types::{Capability, Slot};

use crate::context::StorageContext;

impl<B: BoardSupport> StorageContext<B> {
    /// Ask the USB host driver to call `callback` when a drive is inserted.
    ///
    /// Only one callback can ever be registered per context. The device
    /// created here stays in the USB slot and is reused by later mounts.
    pub fn register_hotplug_callback(
        &mut self,
        slot: Slot,
        callback: Option<HotplugCallback>,
    ) -> Result<(), StorageError> {
        if self.hotplug_registered {
            return Err(StorageError::new(
                StorageErrorKind::Busy,
                "a hot-plug callback is already registered",
            ));
        }

        let Some(callback) = callback else {
            return Err(StorageError::new(
                StorageErrorKind::BadAddress,
                "no hot-plug callback given",
            ));
        };

        match slot {
            Slot::SdCard => Err(StorageError::new(
                StorageErrorKind::NotSupported,
                "the SD card slot has no insertion events",
            )),
            Slot::Usb => self.register_usb_callback(callback),
        }
    }

    fn register_usb_callback(&mut self, callback: HotplugCallback) -> Result<(), StorageError> {
        if self.registry.usb.has_device() {
            return Err(StorageError::new(
                StorageErrorKind::Busy,
                "the USB slot already holds a device",
            ));
        }

        if !self.capabilities.contains(Capability::Hotplug) {
            return Err(StorageError::new(
                StorageErrorKind::NotSupported,
                "the USB host driver has no insertion callback",
            ));
        }

        let mut device = self.board.new_usb_device().ok_or_else(|| {
            StorageError::new(
                StorageErrorKind::NoSuchDevice,
                "failed to allocate USB mass storage device",
            )
        })?;

        if !device.attach_detected_callback(callback) {
            return Err(StorageError::new(
                StorageErrorKind::InvalidArgument,
                "USB host driver rejected the callback",
            ));
        }

        self.registry.usb.device = Some(device);
        self.hotplug_registered = true;
        tracing::info!("Hot-plug callback registered on the USB slot");
        Ok(())
    }

    /// Not available on any platform.
    pub fn deregister_hotplug_callback(&mut self, slot: Slot) -> Result<(), StorageError> {
        Err(StorageError::new(
            StorageErrorKind::NotImplemented,
            format!("hot-plug deregistration is not available for {slot}"),
        ))
    }
}
