// SPDX-License-Identifier: GPL-3.0-only

//! Low-level helpers for the removable storage core
//!
//! This crate holds the pieces that talk to hardware or interpret raw driver
//! output, kept apart from the binding state machine:
//! - Board variant detection on the VBUS sense pin
//! - Translation of driver status codes into the error taxonomy

#[cfg(all(feature = "override-standard", feature = "override-machine-control"))]
compile_error!(
    "features `override-standard` and `override-machine-control` are mutually exclusive"
);

pub mod detect;
pub mod errno;

pub use detect::{BUILD_OVERRIDE, PROBE_ROUNDS, detect_board, detect_variant, probe_once};
pub use errno::translate;
