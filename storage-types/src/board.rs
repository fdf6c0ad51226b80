// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};

/// Physical board variant, as established by probing or by build configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardVariant {
    /// Probing failed or disagreed. Treated as "no special handling".
    #[default]
    Unknown,
    /// Plain carrier board: probe pin floats and follows the injected level.
    Standard,
    /// Industrial controller: external pull-up on the probe pin, no SD
    /// connector, and the USB-A socket must be powered explicitly.
    MachineControl,
    /// Platform identified at build time. No probe runs.
    Fixed,
}

impl BoardVariant {
    pub fn lacks_sd_slot(self) -> bool {
        self == Self::MachineControl
    }

    pub fn needs_manual_usb_power(self) -> bool {
        self == Self::MachineControl
    }
}

/// Forced detection result, bypassing the electrical probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardOverride {
    Standard,
    MachineControl,
}

impl From<BoardOverride> for BoardVariant {
    fn from(value: BoardOverride) -> Self {
        match value {
            BoardOverride::Standard => BoardVariant::Standard,
            BoardOverride::MachineControl => BoardVariant::MachineControl,
        }
    }
}
