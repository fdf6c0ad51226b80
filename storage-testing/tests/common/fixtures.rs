// SPDX-License-Identifier: GPL-3.0-only

use storage_posix::{PosixStorage, StorageContext};
use storage_testing::sim::{Media, SimBoard, SimHandle};
use storage_types::{PlatformConfig, Slot};

pub fn context(config: PlatformConfig) -> (StorageContext<SimBoard>, SimHandle) {
    let board = SimBoard::new(&config);
    let sim = board.handle();
    (StorageContext::new(board, config), sim)
}

pub fn posix(config: PlatformConfig) -> (PosixStorage<SimBoard>, SimHandle) {
    let (context, sim) = context(config);
    (PosixStorage::from_context(context), sim)
}

/// Minimal host with the given media in both slots.
pub fn minimal_with(media: Media) -> (StorageContext<SimBoard>, SimHandle) {
    let (context, sim) = context(PlatformConfig::minimal_host());
    for slot in Slot::ALL {
        sim.insert_media(slot, media);
    }
    (context, sim)
}
