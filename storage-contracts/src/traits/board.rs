// SPDX-License-Identifier: GPL-3.0-only

use embedded_hal::delay::DelayNs;

use crate::traits::{BlockDevice, FatDriver, LittleFsDriver, ProbePin, UsbHostDevice};

/// Board support package: constructs the concrete drivers for the target.
///
/// Constructors return `None` when the driver object cannot be allocated.
pub trait BoardSupport {
    type SdDevice: BlockDevice;
    type UsbDevice: UsbHostDevice;
    type Fat: FatDriver;
    type LittleFs: LittleFsDriver;
    type ProbePin: ProbePin;
    type Delay: DelayNs;

    fn new_sd_device(&mut self) -> Option<Self::SdDevice>;

    fn new_usb_device(&mut self) -> Option<Self::UsbDevice>;

    fn new_fat(&mut self, mount_point: &str) -> Option<Self::Fat>;

    fn new_littlefs(&mut self, mount_point: &str) -> Option<Self::LittleFs>;

    /// Switch on VBUS for the USB-A socket on boards that do not do it in hardware.
    fn enable_usb_power(&mut self);

    /// VBUS sense pin and a delay source, if the board has them.
    fn probe_hardware(&mut self) -> Option<(&mut Self::ProbePin, &mut Self::Delay)>;
}
