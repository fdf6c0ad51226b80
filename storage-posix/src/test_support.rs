// SPDX-License-Identifier: GPL-3.0-only

//! In-crate fakes for unit tests. The full simulator lives in storage-testing.

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin};
use storage_contracts::{
    BlockDevice, BoardSupport, DriverStatus, FatDriver, FilesystemDriver, HotplugCallback,
    LittleFsDriver, ProbePin, Pull, UsbHostDevice,
};

#[derive(Debug)]
pub struct FakeState {
    pub live_devices: usize,
    pub live_volumes: usize,
    pub sd_alloc: bool,
    pub usb_alloc: bool,
    pub fs_alloc: bool,
    pub usb_connects: bool,
    pub attach_accepted: bool,
    pub mount_status: DriverStatus,
    pub reformat_status: DriverStatus,
    pub unmount_status: DriverStatus,
    pub power_enables: usize,
    pub pin_pulled_up: bool,
    pub probe_runs: usize,
    pub last_fat_allocation_unit: Option<u32>,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            live_devices: 0,
            live_volumes: 0,
            sd_alloc: true,
            usb_alloc: true,
            fs_alloc: true,
            usb_connects: true,
            attach_accepted: true,
            mount_status: 0,
            reformat_status: 0,
            unmount_status: 0,
            power_enables: 0,
            pin_pulled_up: false,
            probe_runs: 0,
            last_fat_allocation_unit: None,
        }
    }
}

type Shared = Rc<RefCell<FakeState>>;

pub struct FakeDevice {
    state: Shared,
    connected: bool,
}

impl FakeDevice {
    fn new(state: &Shared) -> Self {
        state.borrow_mut().live_devices += 1;
        Self {
            state: state.clone(),
            connected: false,
        }
    }
}

impl Drop for FakeDevice {
    fn drop(&mut self) {
        self.state.borrow_mut().live_devices -= 1;
    }
}

impl BlockDevice for FakeDevice {
    fn connected(&self) -> bool {
        self.connected
    }

    fn connect(&mut self) -> bool {
        self.connected = self.state.borrow().usb_connects;
        self.connected
    }
}

impl UsbHostDevice for FakeDevice {
    fn attach_detected_callback(&mut self, _callback: HotplugCallback) -> bool {
        self.state.borrow().attach_accepted
    }
}

pub struct FakeFs {
    state: Shared,
}

impl FakeFs {
    fn new(state: &Shared) -> Self {
        state.borrow_mut().live_volumes += 1;
        Self {
            state: state.clone(),
        }
    }
}

impl Drop for FakeFs {
    fn drop(&mut self) {
        self.state.borrow_mut().live_volumes -= 1;
    }
}

impl FilesystemDriver for FakeFs {
    fn mount(&mut self, _device: &mut dyn BlockDevice) -> DriverStatus {
        self.state.borrow().mount_status
    }

    fn unmount(&mut self) -> DriverStatus {
        self.state.borrow().unmount_status
    }
}

impl FatDriver for FakeFs {
    fn reformat(&mut self, _device: &mut dyn BlockDevice, allocation_unit: u32) -> DriverStatus {
        let mut state = self.state.borrow_mut();
        state.last_fat_allocation_unit = Some(allocation_unit);
        state.reformat_status
    }
}

impl LittleFsDriver for FakeFs {
    fn reformat(&mut self, _device: &mut dyn BlockDevice) -> DriverStatus {
        self.state.borrow().reformat_status
    }
}

pub struct FakePin {
    state: Shared,
    pull: Pull,
}

impl ErrorType for FakePin {
    type Error = Infallible;
}

impl InputPin for FakePin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        let state = self.state.borrow();
        Ok(state.pin_pulled_up || self.pull == Pull::Up)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

impl ProbePin for FakePin {
    fn set_pull(&mut self, pull: Pull) {
        if pull == Pull::None {
            // Floating input keeps the last injected level
            return;
        }
        if pull == Pull::Down {
            self.state.borrow_mut().probe_runs += 1;
        }
        self.pull = pull;
    }
}

pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

pub struct FakeBoard {
    pub state: Shared,
    pin: FakePin,
    delay: NoDelay,
}

impl Default for FakeBoard {
    fn default() -> Self {
        let state = Shared::default();
        Self {
            pin: FakePin {
                state: state.clone(),
                pull: Pull::Up,
            },
            delay: NoDelay,
            state,
        }
    }
}

impl FakeBoard {
    pub fn live_devices(&self) -> usize {
        self.state.borrow().live_devices
    }

    pub fn live_volumes(&self) -> usize {
        self.state.borrow().live_volumes
    }

    pub fn set(&self, update: impl FnOnce(&mut FakeState)) {
        update(&mut self.state.borrow_mut());
    }
}

impl BoardSupport for FakeBoard {
    type SdDevice = FakeDevice;
    type UsbDevice = FakeDevice;
    type Fat = FakeFs;
    type LittleFs = FakeFs;
    type ProbePin = FakePin;
    type Delay = NoDelay;

    fn new_sd_device(&mut self) -> Option<FakeDevice> {
        let alloc = self.state.borrow().sd_alloc;
        alloc.then(|| FakeDevice::new(&self.state))
    }

    fn new_usb_device(&mut self) -> Option<FakeDevice> {
        let alloc = self.state.borrow().usb_alloc;
        alloc.then(|| FakeDevice::new(&self.state))
    }

    fn new_fat(&mut self, _mount_point: &str) -> Option<FakeFs> {
        let alloc = self.state.borrow().fs_alloc;
        alloc.then(|| FakeFs::new(&self.state))
    }

    fn new_littlefs(&mut self, _mount_point: &str) -> Option<FakeFs> {
        let alloc = self.state.borrow().fs_alloc;
        alloc.then(|| FakeFs::new(&self.state))
    }

    fn enable_usb_power(&mut self) {
        self.state.borrow_mut().power_enables += 1;
    }

    fn probe_hardware(&mut self) -> Option<(&mut FakePin, &mut NoDelay)> {
        Some((&mut self.pin, &mut self.delay))
    }
}
