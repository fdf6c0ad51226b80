// SPDX-License-Identifier: GPL-3.0-only

//! Platform capability configuration
//!
//! Selects which slots exist and how the USB host driver behaves on the
//! target. Loaded once at startup and injected into the storage context.

use anyhow::{Result, bail};
use enumflags2::{BitFlags, bitflags};
use serde::{Deserialize, Serialize};

use crate::{BoardOverride, Slot};

/// Individual platform capabilities
#[bitflags]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// The platform has an SD card driver and connector.
    SdSlot = 1 << 0,
    /// The board variant can be probed on the VBUS sense pin.
    BoardProbe = 1 << 1,
    /// The USB host driver may be dropped and recreated.
    SafeUsbTeardown = 1 << 2,
    /// The USB host driver reports device insertion through a callback.
    Hotplug = 1 << 3,
}

/// Family of USB mass-storage host driver shipped with the platform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsbHostClass {
    /// Bare-metal host stack with a device-detected callback
    #[default]
    Minimal,
    /// RTOS-hosted stack without callback support
    EmbeddedOs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub usb_host: UsbHostClass,

    /// SD connector present on the platform
    pub sd_slot: bool,

    /// Run board variant detection on first mount/format
    pub board_probe: bool,

    /// USB device objects can be dropped safely
    pub safe_usb_teardown: bool,

    /// Skip probing and assume this variant
    pub board_override: Option<BoardOverride>,

    pub sd_mount_point: String,
    pub usb_mount_point: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self::minimal_host()
    }
}

impl PlatformConfig {
    /// Bare-metal platform: SD slot, hot-plug callbacks, no variant probing.
    pub fn minimal_host() -> Self {
        Self {
            usb_host: UsbHostClass::Minimal,
            sd_slot: true,
            board_probe: false,
            safe_usb_teardown: true,
            board_override: None,
            sd_mount_point: "sdcard".to_string(),
            usb_mount_point: "usb".to_string(),
        }
    }

    /// RTOS platform whose carrier board must be probed. The USB host
    /// object there does not survive destruction, so it is kept around.
    pub fn embedded_os_host() -> Self {
        Self {
            usb_host: UsbHostClass::EmbeddedOs,
            sd_slot: true,
            board_probe: true,
            safe_usb_teardown: false,
            ..Self::minimal_host()
        }
    }

    /// RTOS controller without an SD connector.
    pub fn usb_only_controller() -> Self {
        Self {
            sd_slot: false,
            ..Self::embedded_os_host()
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sd_mount_point.trim().is_empty() || self.usb_mount_point.trim().is_empty() {
            bail!("mount point names must not be empty");
        }

        if self.sd_mount_point == self.usb_mount_point {
            bail!(
                "sd and usb slots share the mount point '{}'",
                self.sd_mount_point
            );
        }

        if self.board_override.is_some() && !self.board_probe {
            bail!("board_override requires a platform with board_probe enabled");
        }

        Ok(())
    }

    pub fn capabilities(&self) -> BitFlags<Capability> {
        let mut caps = BitFlags::empty();
        if self.sd_slot {
            caps |= Capability::SdSlot;
        }
        if self.board_probe {
            caps |= Capability::BoardProbe;
        }
        if self.safe_usb_teardown {
            caps |= Capability::SafeUsbTeardown;
        }
        if self.usb_host == UsbHostClass::Minimal {
            caps |= Capability::Hotplug;
        }
        caps
    }

    pub fn mount_point(&self, slot: Slot) -> &str {
        match slot {
            Slot::SdCard => &self.sd_mount_point,
            Slot::Usb => &self.usb_mount_point,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_map_to_expected_capabilities() {
        let minimal = PlatformConfig::minimal_host().capabilities();
        assert!(minimal.contains(Capability::Hotplug | Capability::SafeUsbTeardown));
        assert!(minimal.contains(Capability::SdSlot));
        assert!(!minimal.contains(Capability::BoardProbe));

        let rtos = PlatformConfig::embedded_os_host().capabilities();
        assert!(rtos.contains(Capability::BoardProbe | Capability::SdSlot));
        assert!(!rtos.intersects(Capability::Hotplug | Capability::SafeUsbTeardown));

        let controller = PlatformConfig::usb_only_controller().capabilities();
        assert!(!controller.contains(Capability::SdSlot));
    }

    #[test]
    fn parses_partial_toml_over_defaults() {
        let config = PlatformConfig::from_toml_str(
            "usb_host = \"embedded_os\"\nboard_probe = true\nboard_override = \"machine_control\"\n",
        )
        .expect("parse platform config");

        assert_eq!(config.usb_host, UsbHostClass::EmbeddedOs);
        assert_eq!(config.board_override, Some(BoardOverride::MachineControl));
        assert_eq!(config.mount_point(Slot::SdCard), "sdcard");
        assert_eq!(config.mount_point(Slot::Usb), "usb");
    }

    #[test]
    fn rejects_override_without_probe() {
        let error = PlatformConfig::from_toml_str("board_override = \"standard\"\n")
            .expect_err("override on a fixed platform");
        assert!(error.to_string().contains("board_probe"));
    }

    #[test]
    fn rejects_shared_or_empty_mount_points() {
        let shared = PlatformConfig {
            usb_mount_point: "sdcard".to_string(),
            ..PlatformConfig::minimal_host()
        };
        assert!(shared.validate().is_err());

        let empty = PlatformConfig {
            sd_mount_point: "  ".to_string(),
            ..PlatformConfig::minimal_host()
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn config_roundtrips_through_json() {
        let config = PlatformConfig::embedded_os_host();
        let json = serde_json::to_string(&config).expect("serialize config");
        let parsed: PlatformConfig = serde_json::from_str(&json).expect("deserialize config");
        assert_eq!(parsed, config);
    }
}
