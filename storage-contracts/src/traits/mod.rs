// SPDX-License-Identifier: GPL-3.0-only

pub mod board;
pub mod device;
pub mod filesystem;
pub mod probe;

pub use board::BoardSupport;
pub use device::{BlockDevice, HotplugCallback, UsbHostDevice};
pub use filesystem::{DriverStatus, FatDriver, FilesystemDriver, LittleFsDriver};
pub use probe::{ProbePin, Pull};
