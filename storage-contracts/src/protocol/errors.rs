// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified failure taxonomy reported by every public storage operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageErrorKind {
    /// A required argument was missing (null callback, empty mount point).
    BadAddress,
    /// The slot is already bound, or a hot-plug callback is already registered.
    Busy,
    /// Allocation or connection failure.
    NoSuchDevice,
    /// The slot does not exist on this hardware.
    NoSuchBlockDevice,
    /// Unsupported flag or missing platform capability.
    NotSupported,
    /// Operation on a slot that is not mounted.
    InvalidArgument,
    /// Operation not provided on any platform.
    NotImplemented,
    /// Positive errno-style code passed through from a driver.
    Driver(i32),
}

impl StorageErrorKind {
    /// Positive errno value for the POSIX-style error indicator
    pub fn errno(self) -> i32 {
        match self {
            Self::BadAddress => libc::EFAULT,
            Self::Busy => libc::EBUSY,
            Self::NoSuchDevice => libc::ENODEV,
            Self::NoSuchBlockDevice => libc::ENOTBLK,
            Self::NotSupported => libc::ENOTSUP,
            Self::InvalidArgument => libc::EINVAL,
            Self::NotImplemented => libc::ENOSYS,
            Self::Driver(code) => code,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind:?}: {message}")]
pub struct StorageError {
    pub kind: StorageErrorKind,
    pub message: String,
}

impl StorageError {
    pub fn new(kind: StorageErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn errno(&self) -> i32 {
        self.kind.errno()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_roundtrips() {
        let error = StorageError::new(StorageErrorKind::Driver(5), "mount failed");
        let json = serde_json::to_string(&error).expect("serialize error");
        let parsed: StorageError = serde_json::from_str(&json).expect("deserialize error");
        assert_eq!(parsed, error);
    }

    #[test]
    fn taxonomy_errno_values_are_stable() {
        assert_eq!(StorageErrorKind::BadAddress.errno(), libc::EFAULT);
        assert_eq!(StorageErrorKind::Busy.errno(), libc::EBUSY);
        assert_eq!(StorageErrorKind::NoSuchDevice.errno(), libc::ENODEV);
        assert_eq!(StorageErrorKind::NoSuchBlockDevice.errno(), libc::ENOTBLK);
        assert_eq!(StorageErrorKind::NotSupported.errno(), libc::ENOTSUP);
        assert_eq!(StorageErrorKind::InvalidArgument.errno(), libc::EINVAL);
        assert_eq!(StorageErrorKind::NotImplemented.errno(), libc::ENOSYS);
        assert_eq!(StorageErrorKind::Driver(libc::EIO).errno(), libc::EIO);
    }

    #[test]
    fn every_code_is_positive() {
        for kind in [
            StorageErrorKind::BadAddress,
            StorageErrorKind::Busy,
            StorageErrorKind::NoSuchDevice,
            StorageErrorKind::NoSuchBlockDevice,
            StorageErrorKind::NotSupported,
            StorageErrorKind::InvalidArgument,
            StorageErrorKind::NotImplemented,
        ] {
            assert!(kind.errno() > 0, "{kind:?}");
        }
    }
}
