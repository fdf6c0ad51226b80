// SPDX-License-Identifier: GPL-3.0-only

//! Filesystem selection types
//!
//! Types describing which on-disk format to attach and how.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Supported on-disk formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilesystemKind {
    /// FAT12/16/32. Best choice for media shared with desktop machines.
    Fat,
    /// Power-loss resilient flash filesystem
    #[serde(rename = "littlefs")]
    LittleFs,
}

impl fmt::Display for FilesystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fat => f.write_str("fat"),
            Self::LittleFs => f.write_str("littlefs"),
        }
    }
}

/// Flags accepted by mount
///
/// Only `Default` is honoured today. `ReadOnly` exists so callers written for
/// platforms that support it fail with a clear error instead of mounting
/// writable by accident.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MountFlags {
    #[default]
    Default,
    ReadOnly,
}

/// What to do with a freshly bound volume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Mount,
    Format,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mount => f.write_str("mount"),
            Self::Format => f.write_str("format"),
        }
    }
}
