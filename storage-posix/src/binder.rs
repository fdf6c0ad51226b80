// SPDX-License-Identifier: GPL-3.0-only

//! Device binding for the SD and USB slots

use storage_contracts::{BlockDevice, BoardSupport, StorageError, StorageErrorKind};
use storage_types::{Capability, Slot};

use crate::context::StorageContext;

/// Whether a failed mount or format may drop the device it was given
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Retention {
    /// Device was created for this call
    Discard,
    /// Device predates this call (hot-plug registration or a retained USB
    /// host object) and must survive a failure
    Keep,
}

impl<B: BoardSupport> StorageContext<B> {
    pub(crate) fn bind(&mut self, slot: Slot) -> Result<Retention, StorageError> {
        match slot {
            Slot::SdCard => self.bind_sd(),
            Slot::Usb => self.bind_usb(),
        }
    }

    fn bind_sd(&mut self) -> Result<Retention, StorageError> {
        if self.registry.sd.has_device() {
            return Err(StorageError::new(
                StorageErrorKind::Busy,
                "an SD card is already mounted",
            ));
        }

        if !self.capabilities.contains(Capability::SdSlot) || self.variant().lacks_sd_slot() {
            return Err(StorageError::new(
                StorageErrorKind::NoSuchBlockDevice,
                "this board has no SD card connector",
            ));
        }

        let device = self.board.new_sd_device().ok_or_else(|| {
            StorageError::new(
                StorageErrorKind::NoSuchDevice,
                "failed to allocate SD card block device",
            )
        })?;
        self.registry.sd.device = Some(device);

        tracing::debug!("SD card block device bound");
        Ok(Retention::Discard)
    }

    fn bind_usb(&mut self) -> Result<Retention, StorageError> {
        if self.variant().needs_manual_usb_power() {
            tracing::debug!("Enabling power on the USB-A socket");
            self.board.enable_usb_power();
        }

        let retention = if self.registry.usb.has_device() {
            if self.registry.usb.is_mounted() {
                return Err(StorageError::new(
                    StorageErrorKind::Busy,
                    "a USB drive is already mounted",
                ));
            }
            tracing::debug!("Reusing existing USB host device");
            Retention::Keep
        } else {
            let device = self.board.new_usb_device().ok_or_else(|| {
                StorageError::new(
                    StorageErrorKind::NoSuchDevice,
                    "failed to allocate USB mass storage device",
                )
            })?;
            self.registry.usb.device = Some(device);
            Retention::Discard
        };

        let Some(device) = self.registry.usb.device.as_mut() else {
            return Err(StorageError::new(
                StorageErrorKind::BadAddress,
                "USB device vanished while binding",
            ));
        };

        if !device.connected() && !device.connect() {
            if retention == Retention::Discard {
                self.dispose(Slot::Usb);
            }
            return Err(StorageError::new(
                StorageErrorKind::NoSuchDevice,
                "USB mass storage device did not connect",
            ));
        }

        tracing::debug!("USB mass storage device bound");
        Ok(retention)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeBoard;
    use storage_types::{BoardVariant, PlatformConfig};

    fn context(config: PlatformConfig) -> StorageContext<FakeBoard> {
        StorageContext::new(FakeBoard::default(), config)
    }

    #[test]
    fn sd_bind_rejects_occupied_slot() {
        let mut ctx = context(PlatformConfig::minimal_host());
        assert_eq!(ctx.bind(Slot::SdCard), Ok(Retention::Discard));

        let error = ctx.bind(Slot::SdCard).expect_err("second bind");
        assert_eq!(error.kind, StorageErrorKind::Busy);
        assert_eq!(ctx.board().live_devices(), 1);
    }

    #[test]
    fn sd_bind_without_connector_is_no_block_device() {
        let mut ctx = context(PlatformConfig::usb_only_controller());
        let error = ctx.bind(Slot::SdCard).expect_err("no connector");
        assert_eq!(error.kind, StorageErrorKind::NoSuchBlockDevice);

        let mut ctx = context(PlatformConfig::embedded_os_host());
        ctx.board_variant = Some(BoardVariant::MachineControl);
        let error = ctx.bind(Slot::SdCard).expect_err("machine control");
        assert_eq!(error.kind, StorageErrorKind::NoSuchBlockDevice);
        assert_eq!(ctx.board().live_devices(), 0);
    }

    #[test]
    fn sd_allocation_failure_is_no_such_device() {
        let mut ctx = context(PlatformConfig::minimal_host());
        ctx.board().set(|state| state.sd_alloc = false);

        let error = ctx.bind(Slot::SdCard).expect_err("allocation failure");
        assert_eq!(error.kind, StorageErrorKind::NoSuchDevice);
        assert!(!ctx.has_device(Slot::SdCard));
    }

    #[test]
    fn usb_connect_failure_drops_new_device() {
        let mut ctx = context(PlatformConfig::minimal_host());
        ctx.board().set(|state| state.usb_connects = false);

        let error = ctx.bind(Slot::Usb).expect_err("connect failure");
        assert_eq!(error.kind, StorageErrorKind::NoSuchDevice);
        assert!(!ctx.has_device(Slot::Usb));
        assert_eq!(ctx.board().live_devices(), 0);
    }

    #[test]
    fn usb_connect_failure_keeps_preexisting_device() {
        let mut ctx = context(PlatformConfig::minimal_host());
        ctx.registry.usb.device = ctx.board.new_usb_device();
        ctx.board().set(|state| state.usb_connects = false);

        let error = ctx.bind(Slot::Usb).expect_err("connect failure");
        assert_eq!(error.kind, StorageErrorKind::NoSuchDevice);
        assert!(ctx.has_device(Slot::Usb));
    }

    #[test]
    fn usb_power_enabled_only_on_machine_control() {
        let mut ctx = context(PlatformConfig::embedded_os_host());
        ctx.board_variant = Some(BoardVariant::Standard);
        ctx.bind(Slot::Usb).expect("bind on standard board");
        assert_eq!(ctx.board().state.borrow().power_enables, 0);

        let mut ctx = context(PlatformConfig::embedded_os_host());
        ctx.board_variant = Some(BoardVariant::MachineControl);
        ctx.bind(Slot::Usb).expect("bind on machine control");
        assert_eq!(ctx.board().state.borrow().power_enables, 1);
    }
}
