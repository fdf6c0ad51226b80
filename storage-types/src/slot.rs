// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two fixed storage attachment points on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    /// SD card connector
    #[serde(rename = "sdcard")]
    SdCard,
    /// USB mass-storage host port
    #[serde(rename = "usb")]
    Usb,
}

impl Slot {
    pub const ALL: [Slot; 2] = [Slot::SdCard, Slot::Usb];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SdCard => "sdcard",
            Self::Usb => "usb",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
