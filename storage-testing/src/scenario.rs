// SPDX-License-Identifier: GPL-3.0-only

//! Lab scenarios
//!
//! A scenario is a TOML file under `resources/scenarios/` describing a
//! platform, the simulated board's initial state and a list of storage
//! calls with their expected outcome.

use std::fs;
use std::path::{Path, PathBuf};

use libc::c_int;
use serde::{Deserialize, Serialize};
use storage_types::{FilesystemKind, MountFlags, PlatformConfig, Slot};

use crate::errors::{Result, TestingError};
use crate::sim::{Fault, Media, ProbeWiring, SimHandle};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Named platform preset. Mutually exclusive with `platform`.
    pub preset: Option<Preset>,
    pub platform: Option<PlatformConfig>,
    #[serde(default)]
    pub board: BoardSetup,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    MinimalHost,
    EmbeddedOsHost,
    UsbOnlyController,
}

impl Preset {
    pub fn config(self) -> PlatformConfig {
        match self {
            Self::MinimalHost => PlatformConfig::minimal_host(),
            Self::EmbeddedOsHost => PlatformConfig::embedded_os_host(),
            Self::UsbOnlyController => PlatformConfig::usb_only_controller(),
        }
    }
}

/// Initial state of the simulated board
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardSetup {
    pub probe: ProbeWiring,
    /// Raw pin levels served before the wiring takes over, two per round.
    pub probe_script: Vec<bool>,
    pub sd: Media,
    pub usb: Media,
}

impl BoardSetup {
    pub fn apply(&self, sim: &SimHandle) {
        sim.set_wiring(self.probe);
        sim.script_levels(self.probe_script.iter().copied());
        sim.insert_media(Slot::SdCard, self.sd);
        sim.insert_media(Slot::Usb, self.usb);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Mount {
        slot: Slot,
        fs: FilesystemKind,
        #[serde(default)]
        flags: MountFlags,
    },
    Mkfs {
        slot: Slot,
        fs: FilesystemKind,
    },
    Umount {
        slot: Slot,
    },
    RegisterHotplug {
        slot: Slot,
        /// `false` passes no callback at all.
        #[serde(default = "default_true")]
        callback: bool,
    },
    DeregisterHotplug {
        slot: Slot,
    },
    PlugUsb {
        /// Medium the new drive carries
        #[serde(default)]
        insert: Media,
    },
    UnplugUsb,
    Inject {
        fault: Fault,
        status: c_int,
    },
}

fn default_true() -> bool {
    true
}

impl Operation {
    pub fn slot(&self) -> Option<Slot> {
        match self {
            Self::Mount { slot, .. }
            | Self::Mkfs { slot, .. }
            | Self::Umount { slot }
            | Self::RegisterHotplug { slot, .. }
            | Self::DeregisterHotplug { slot } => Some(*slot),
            Self::PlugUsb { .. } | Self::UnplugUsb => Some(Slot::Usb),
            Self::Inject { .. } => None,
        }
    }

    /// Whether the step goes through the storage API rather than the board.
    pub fn is_storage_call(&self) -> bool {
        !matches!(
            self,
            Self::PlugUsb { .. } | Self::UnplugUsb | Self::Inject { .. }
        )
    }
}

/// Expected result of a storage call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expect {
    #[default]
    Ok,
    Efault,
    Ebusy,
    Enodev,
    Enotblk,
    Enotsup,
    Einval,
    Enosys,
    Eio,
    Eilseq,
    Enospc,
}

impl Expect {
    /// Expected errno, or `None` for success.
    pub fn errno(self) -> Option<c_int> {
        match self {
            Self::Ok => None,
            Self::Efault => Some(libc::EFAULT),
            Self::Ebusy => Some(libc::EBUSY),
            Self::Enodev => Some(libc::ENODEV),
            Self::Enotblk => Some(libc::ENOTBLK),
            Self::Enotsup => Some(libc::ENOTSUP),
            Self::Einval => Some(libc::EINVAL),
            Self::Enosys => Some(libc::ENOSYS),
            Self::Eio => Some(libc::EIO),
            Self::Eilseq => Some(libc::EILSEQ),
            Self::Enospc => Some(libc::ENOSPC),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    #[serde(flatten)]
    pub op: Operation,
    #[serde(default)]
    pub expect: Expect,
    /// Whether the step's slot holds a mounted volume afterwards
    pub mounted: Option<bool>,
    /// Whether the step's slot holds a device afterwards
    pub device: Option<bool>,
    pub live_devices: Option<usize>,
    pub live_volumes: Option<usize>,
    /// Medium contents of the step's slot afterwards
    pub media: Option<Media>,
    /// Total hot-plug callbacks fired so far
    pub insertions: Option<usize>,
}

impl Scenario {
    pub fn platform_config(&self) -> Result<PlatformConfig> {
        match (&self.preset, &self.platform) {
            (Some(_), Some(_)) => Err(self.invalid("set either preset or [platform], not both")),
            (Some(preset), None) => Ok(preset.config()),
            (None, Some(platform)) => Ok(platform.clone()),
            (None, None) => Ok(PlatformConfig::default()),
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> TestingError {
        TestingError::ScenarioInvalid {
            name: self.name.clone(),
            reason: reason.into(),
        }
    }
}

pub fn workspace_root() -> PathBuf {
    if let Ok(value) = std::env::var("STORAGE_TESTING_WORKSPACE_ROOT") {
        return PathBuf::from(value);
    }

    if let Ok(current_dir) = std::env::current_dir()
        && current_dir.join("resources/scenarios").exists()
    {
        return current_dir;
    }

    let manifest_root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();

    if manifest_root.join("resources/scenarios").exists() {
        return manifest_root;
    }

    PathBuf::from(".")
}

pub fn scenarios_root() -> PathBuf {
    workspace_root().join("resources/scenarios")
}

pub fn scenario_path_for_name(name: &str) -> PathBuf {
    scenarios_root().join(format!("{}.toml", name))
}

/// Names of every scenario file, sorted.
pub fn list_names() -> Result<Vec<String>> {
    let root = scenarios_root();
    let entries = fs::read_dir(&root).map_err(|error| TestingError::ScenarioIo {
        path: root.clone(),
        reason: error.to_string(),
    })?;

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .filter_map(|path| {
            path.file_stem()
                .and_then(|stem| stem.to_str())
                .map(str::to_string)
        })
        .collect();
    names.sort();
    Ok(names)
}

pub fn load_by_name(name: &str) -> Result<Scenario> {
    let path = scenario_path_for_name(name);
    if !path.exists() {
        return Err(TestingError::ScenarioNotFound {
            name: name.to_string(),
        });
    }

    let raw = fs::read_to_string(&path).map_err(|error| TestingError::ScenarioIo {
        path: path.clone(),
        reason: error.to_string(),
    })?;

    from_toml_str(name, &raw)
}

pub fn from_toml_str(name: &str, raw: &str) -> Result<Scenario> {
    let scenario: Scenario = toml::from_str(raw).map_err(|error| TestingError::ScenarioInvalid {
        name: name.to_string(),
        reason: error.to_string(),
    })?;

    validate(&scenario)?;
    Ok(scenario)
}

pub fn validate(scenario: &Scenario) -> Result<()> {
    if scenario.name.is_empty() {
        return Err(TestingError::ScenarioInvalid {
            name: "<unknown>".to_string(),
            reason: "name must not be empty".to_string(),
        });
    }

    if scenario.steps.is_empty() {
        return Err(scenario.invalid("steps must not be empty"));
    }

    if scenario.board.probe_script.len() % 2 != 0 {
        return Err(scenario.invalid("probe_script needs two levels per probe round"));
    }

    let config = scenario.platform_config()?;
    config
        .validate()
        .map_err(|error| TestingError::PlatformInvalid {
            reason: error.to_string(),
        })?;

    for (index, step) in scenario.steps.iter().enumerate() {
        if !step.op.is_storage_call() && step.expect != Expect::Ok {
            return Err(scenario.invalid(format!(
                "step {index}: board actions cannot expect an error"
            )));
        }
    }

    Ok(())
}
