// SPDX-License-Identifier: GPL-3.0-only

//! Off-target harness for the storage lifecycle core
//!
//! - [`sim`]: simulated SD/USB devices, filesystem drivers and probe pin
//! - [`scenario`]: TOML scenario files under `resources/scenarios/`
//! - [`runner`]: executes scenarios through the integer storage API

pub mod errors;
pub mod runner;
pub mod scenario;
pub mod sim;
