// SPDX-License-Identifier: GPL-3.0-only

/// Function invoked by the USB host driver when a drive is inserted.
///
/// The driver calls it from its own interrupt or polling context. It must not
/// call back into the storage context.
pub type HotplugCallback = fn();

/// Raw block device as seen by a filesystem driver
pub trait BlockDevice {
    /// Whether the underlying medium is present and initialised.
    fn connected(&self) -> bool;

    /// Try to bring the medium up. Returns `true` once connected.
    fn connect(&mut self) -> bool;
}

/// USB mass-storage host device
pub trait UsbHostDevice: BlockDevice {
    /// Attach the insertion callback. Returns `false` if the driver rejected it.
    fn attach_detected_callback(&mut self, callback: HotplugCallback) -> bool;
}
