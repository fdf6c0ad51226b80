// SPDX-License-Identifier: GPL-3.0-only

//! Simulated board for exercising the storage core off-target
//!
//! Every driver object shares one [`SimState`], so a test can inspect live
//! object counts, inject driver failures and plug media in or out while the
//! storage context owns the drivers.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin};
use serde::{Deserialize, Serialize};
use storage_contracts::{
    BlockDevice, BoardSupport, DriverStatus, FatDriver, FilesystemDriver, HotplugCallback,
    LittleFsDriver, ProbePin, Pull, UsbHostDevice,
};
use storage_types::{FilesystemKind, PlatformConfig, Slot};

/// Contents of a simulated medium
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Media {
    /// Nothing inserted
    Absent,
    /// Inserted, no recognisable filesystem
    #[default]
    Blank,
    Fat,
    #[serde(rename = "littlefs")]
    LittleFs,
}

impl Media {
    fn format(self) -> Option<FilesystemKind> {
        match self {
            Self::Fat => Some(FilesystemKind::Fat),
            Self::LittleFs => Some(FilesystemKind::LittleFs),
            Self::Absent | Self::Blank => None,
        }
    }
}

impl From<FilesystemKind> for Media {
    fn from(kind: FilesystemKind) -> Self {
        match kind {
            FilesystemKind::Fat => Self::Fat,
            FilesystemKind::LittleFs => Self::LittleFs,
        }
    }
}

/// Electrical behaviour of the VBUS sense pin
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeWiring {
    /// Plain carrier board: the pin holds the last injected level.
    #[default]
    Floating,
    /// Industrial controller: external pull-up, always high.
    PulledUp,
    /// No probe hardware reachable
    Absent,
}

/// One-shot driver failures, consumed by the next matching call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fault {
    Mount,
    Reformat,
    Unmount,
}

#[derive(Debug)]
pub struct SimState {
    mount_points: HashMap<String, Slot>,
    media: HashMap<Slot, Media>,

    pub sd_alloc: bool,
    pub usb_alloc: bool,
    pub fs_alloc: bool,
    pub attach_accepted: bool,
    faults: HashMap<Fault, DriverStatus>,

    pub live_devices: usize,
    pub live_volumes: usize,
    pub devices_created: usize,
    pub usb_power_enabled: bool,

    callback: Option<HotplugCallback>,

    wiring: ProbeWiring,
    script: VecDeque<bool>,
    pub probe_runs: usize,
    pub elapsed_ns: u64,
}

impl SimState {
    fn new(config: &PlatformConfig) -> Self {
        let mount_points = Slot::ALL
            .into_iter()
            .map(|slot| (config.mount_point(slot).to_string(), slot))
            .collect();

        Self {
            mount_points,
            media: HashMap::new(),
            sd_alloc: true,
            usb_alloc: true,
            fs_alloc: true,
            attach_accepted: true,
            faults: HashMap::new(),
            live_devices: 0,
            live_volumes: 0,
            devices_created: 0,
            usb_power_enabled: false,
            callback: None,
            wiring: ProbeWiring::default(),
            script: VecDeque::new(),
            probe_runs: 0,
            elapsed_ns: 0,
        }
    }

    pub fn media(&self, slot: Slot) -> Media {
        self.media.get(&slot).copied().unwrap_or(Media::Absent)
    }

    fn media_at(&self, mount_point: &str) -> Media {
        self.mount_points
            .get(mount_point)
            .map_or(Media::Absent, |slot| self.media(*slot))
    }

    fn take_fault(&mut self, fault: Fault) -> Option<DriverStatus> {
        self.faults.remove(&fault)
    }
}

type Shared = Rc<RefCell<SimState>>;

/// SD card or USB mass-storage device
pub struct SimDevice {
    state: Shared,
    slot: Slot,
    connected: bool,
    owns_callback: bool,
}

impl SimDevice {
    fn new(state: &Shared, slot: Slot) -> Self {
        {
            let mut state = state.borrow_mut();
            state.live_devices += 1;
            state.devices_created += 1;
        }
        Self {
            state: state.clone(),
            slot,
            connected: false,
            owns_callback: false,
        }
    }
}

impl Drop for SimDevice {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.live_devices -= 1;
        if self.owns_callback {
            state.callback = None;
        }
    }
}

impl BlockDevice for SimDevice {
    fn connected(&self) -> bool {
        self.connected && self.state.borrow().media(self.slot) != Media::Absent
    }

    fn connect(&mut self) -> bool {
        let state = self.state.borrow();
        // Only the pulled-up board leaves VBUS switched off until asked
        let powered = self.slot == Slot::SdCard
            || state.wiring != ProbeWiring::PulledUp
            || state.usb_power_enabled;
        self.connected = powered && state.media(self.slot) != Media::Absent;
        self.connected
    }
}

impl UsbHostDevice for SimDevice {
    fn attach_detected_callback(&mut self, callback: HotplugCallback) -> bool {
        let mut state = self.state.borrow_mut();
        if !state.attach_accepted {
            return false;
        }
        state.callback = Some(callback);
        self.owns_callback = true;
        true
    }
}

/// FAT or LittleFS driver bound to a mount point
pub struct SimFilesystem {
    state: Shared,
    kind: FilesystemKind,
    mount_point: String,
    mounted: bool,
}

impl SimFilesystem {
    fn new(state: &Shared, kind: FilesystemKind, mount_point: &str) -> Self {
        state.borrow_mut().live_volumes += 1;
        Self {
            state: state.clone(),
            kind,
            mount_point: mount_point.to_string(),
            mounted: false,
        }
    }

    /// Status the real driver reports when no valid volume is found
    fn no_filesystem(&self) -> DriverStatus {
        match self.kind {
            FilesystemKind::Fat => -libc::EINVAL,
            FilesystemKind::LittleFs => -libc::EILSEQ,
        }
    }

    fn reformat_medium(&mut self) -> DriverStatus {
        let mut state = self.state.borrow_mut();
        if let Some(status) = state.take_fault(Fault::Reformat) {
            return status;
        }

        let Some(slot) = state.mount_points.get(&self.mount_point).copied() else {
            return -libc::ENODEV;
        };
        if state.media(slot) == Media::Absent {
            return -libc::EIO;
        }

        state.media.insert(slot, self.kind.into());
        self.mounted = true;
        0
    }
}

impl Drop for SimFilesystem {
    fn drop(&mut self) {
        self.state.borrow_mut().live_volumes -= 1;
    }
}

impl FilesystemDriver for SimFilesystem {
    fn mount(&mut self, device: &mut dyn BlockDevice) -> DriverStatus {
        if !device.connected() && !device.connect() {
            return -libc::EIO;
        }

        let mut state = self.state.borrow_mut();
        if let Some(status) = state.take_fault(Fault::Mount) {
            return status;
        }

        match state.media_at(&self.mount_point) {
            Media::Absent => -libc::EIO,
            media if media.format() == Some(self.kind) => {
                self.mounted = true;
                0
            }
            _ => self.no_filesystem(),
        }
    }

    fn unmount(&mut self) -> DriverStatus {
        if let Some(status) = self.state.borrow_mut().take_fault(Fault::Unmount) {
            return status;
        }
        if !self.mounted {
            return -libc::EINVAL;
        }
        self.mounted = false;
        0
    }
}

impl FatDriver for SimFilesystem {
    fn reformat(&mut self, _device: &mut dyn BlockDevice, _allocation_unit: u32) -> DriverStatus {
        self.reformat_medium()
    }
}

impl LittleFsDriver for SimFilesystem {
    fn reformat(&mut self, _device: &mut dyn BlockDevice) -> DriverStatus {
        self.reformat_medium()
    }
}

/// VBUS sense pin
pub struct SimPin {
    state: Shared,
    level: bool,
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        let mut state = self.state.borrow_mut();
        if let Some(level) = state.script.pop_front() {
            return Ok(level);
        }
        Ok(match state.wiring {
            ProbeWiring::PulledUp => true,
            ProbeWiring::Floating | ProbeWiring::Absent => self.level,
        })
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

impl ProbePin for SimPin {
    fn set_pull(&mut self, pull: Pull) {
        match pull {
            Pull::Up => self.level = true,
            Pull::Down => {
                self.level = false;
                self.state.borrow_mut().probe_runs += 1;
            }
            Pull::None => {}
        }
    }
}

/// Delay source that records elapsed time instead of sleeping
pub struct SimDelay {
    state: Shared,
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.state.borrow_mut().elapsed_ns += u64::from(ns);
    }
}

pub struct SimBoard {
    state: Shared,
    pin: SimPin,
    delay: SimDelay,
}

impl SimBoard {
    /// Board with blank media in both slots and a floating probe pin.
    pub fn new(config: &PlatformConfig) -> Self {
        let state = Rc::new(RefCell::new(SimState::new(config)));
        {
            let mut state = state.borrow_mut();
            state.media.insert(Slot::SdCard, Media::Blank);
            state.media.insert(Slot::Usb, Media::Blank);
        }

        Self {
            pin: SimPin {
                state: state.clone(),
                level: true,
            },
            delay: SimDelay {
                state: state.clone(),
            },
            state,
        }
    }

    /// Handle to the shared state that stays valid after the board is moved
    /// into a storage context.
    pub fn handle(&self) -> SimHandle {
        SimHandle {
            state: self.state.clone(),
        }
    }
}

impl BoardSupport for SimBoard {
    type SdDevice = SimDevice;
    type UsbDevice = SimDevice;
    type Fat = SimFilesystem;
    type LittleFs = SimFilesystem;
    type ProbePin = SimPin;
    type Delay = SimDelay;

    fn new_sd_device(&mut self) -> Option<SimDevice> {
        let alloc = self.state.borrow().sd_alloc;
        alloc.then(|| SimDevice::new(&self.state, Slot::SdCard))
    }

    fn new_usb_device(&mut self) -> Option<SimDevice> {
        let alloc = self.state.borrow().usb_alloc;
        alloc.then(|| SimDevice::new(&self.state, Slot::Usb))
    }

    fn new_fat(&mut self, mount_point: &str) -> Option<SimFilesystem> {
        let alloc = self.state.borrow().fs_alloc;
        alloc.then(|| SimFilesystem::new(&self.state, FilesystemKind::Fat, mount_point))
    }

    fn new_littlefs(&mut self, mount_point: &str) -> Option<SimFilesystem> {
        let alloc = self.state.borrow().fs_alloc;
        alloc.then(|| SimFilesystem::new(&self.state, FilesystemKind::LittleFs, mount_point))
    }

    fn enable_usb_power(&mut self) {
        self.state.borrow_mut().usb_power_enabled = true;
    }

    fn probe_hardware(&mut self) -> Option<(&mut SimPin, &mut SimDelay)> {
        if self.state.borrow().wiring == ProbeWiring::Absent {
            return None;
        }
        Some((&mut self.pin, &mut self.delay))
    }
}

/// Test-side view of a [`SimBoard`]
#[derive(Clone)]
pub struct SimHandle {
    state: Shared,
}

impl SimHandle {
    pub fn with<R>(&self, inspect: impl FnOnce(&SimState) -> R) -> R {
        inspect(&self.state.borrow())
    }

    pub fn set(&self, update: impl FnOnce(&mut SimState)) {
        update(&mut self.state.borrow_mut());
    }

    pub fn live_devices(&self) -> usize {
        self.with(|state| state.live_devices)
    }

    pub fn live_volumes(&self) -> usize {
        self.with(|state| state.live_volumes)
    }

    pub fn media(&self, slot: Slot) -> Media {
        self.with(|state| state.media(slot))
    }

    pub fn insert_media(&self, slot: Slot, media: Media) {
        self.set(|state| {
            state.media.insert(slot, media);
        });
    }

    pub fn set_wiring(&self, wiring: ProbeWiring) {
        self.set(|state| state.wiring = wiring);
    }

    /// Queue raw pin levels; each probe round reads two.
    pub fn script_levels(&self, levels: impl IntoIterator<Item = bool>) {
        self.set(|state| state.script.extend(levels));
    }

    pub fn inject(&self, fault: Fault, status: DriverStatus) {
        self.set(|state| {
            state.faults.insert(fault, status);
        });
    }

    pub fn callback_attached(&self) -> bool {
        self.with(|state| state.callback.is_some())
    }

    /// Insert a USB drive and fire the attached callback, if any.
    ///
    /// Returns whether a callback ran.
    pub fn plug_usb(&self, media: Media) -> bool {
        let callback = {
            let mut state = self.state.borrow_mut();
            state.media.insert(Slot::Usb, media);
            state.callback
        };

        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    pub fn unplug_usb(&self) {
        self.insert_media(Slot::Usb, Media::Absent);
    }
}
