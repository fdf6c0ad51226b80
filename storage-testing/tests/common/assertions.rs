// SPDX-License-Identifier: GPL-3.0-only

use storage_posix::StorageContext;
use storage_testing::sim::{SimBoard, SimHandle};
use storage_types::Slot;

pub fn assert_slot_empty(context: &StorageContext<SimBoard>, slot: Slot) {
    assert!(!context.has_device(slot), "{slot} still holds a device");
    assert!(!context.is_mounted(slot), "{slot} still holds a volume");
}

pub fn assert_no_live_objects(sim: &SimHandle) {
    assert_eq!(sim.live_devices(), 0, "leaked block devices");
    assert_eq!(sim.live_volumes(), 0, "leaked filesystem drivers");
}
