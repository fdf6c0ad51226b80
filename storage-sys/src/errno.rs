// SPDX-License-Identifier: GPL-3.0-only

//! Driver status translation
//!
//! Filesystem drivers report `0` for success and an errno-style code
//! otherwise. Most return negative codes, some positive ones.
//!
//! Caveat: FAT drivers remap legacy on-disk result codes (`FR_*`) onto negative
//! errno values with a catch-all `-res` for codes they do not know. The two
//! numeric ranges overlap, so an on-disk code added after the remap table was
//! written surfaces as an unrelated errno (a new code 20 reads as `ENOTDIR`).
//! Nothing at this layer can tell the two apart. LittleFS passes its own
//! negative errno values through unchanged and is not affected.

use storage_contracts::{DriverStatus, StorageErrorKind};

pub fn translate(status: DriverStatus) -> Result<(), StorageErrorKind> {
    match status {
        0 => Ok(()),
        code if code < 0 => Err(StorageErrorKind::Driver(
            code.checked_neg().unwrap_or(i32::MAX),
        )),
        code => Err(StorageErrorKind::Driver(code)),
    }
}
