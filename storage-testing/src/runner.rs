// SPDX-License-Identifier: GPL-3.0-only

//! Scenario runner
//!
//! Drives a [`Scenario`] through the integer storage API against a fresh
//! [`SimBoard`] and checks every step's return value, errno and the
//! resulting slot state.

use std::cell::Cell;
use std::fmt;

use libc::c_int;
use serde::Serialize;
use storage_posix::PosixStorage;
use storage_types::BoardVariant;

use crate::errors::{Result, TestingError};
use crate::scenario::{Expect, Operation, Scenario, Step};
use crate::sim::{SimBoard, SimHandle};

thread_local! {
    static INSERTIONS: Cell<usize> = const { Cell::new(0) };
}

/// Hot-plug callback handed to the storage API by scenarios.
pub fn record_insertion() {
    INSERTIONS.with(|count| count.set(count.get() + 1));
}

/// Callbacks fired on this thread since the last reset.
pub fn insertions() -> usize {
    INSERTIONS.with(Cell::get)
}

pub fn reset_insertions() {
    INSERTIONS.with(|count| count.set(0));
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub operation: String,
    pub expected: Expect,
    pub returned: c_int,
    pub errno: c_int,
    pub failures: Vec<String>,
}

impl StepReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for StepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.passed() { "ok" } else { "FAIL" };
        write!(
            f,
            "[{marker}] {:>2} {} -> {} (errno {})",
            self.index, self.operation, self.returned, self.errno
        )?;
        for failure in &self.failures {
            write!(f, "\n       {failure}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub scenario: String,
    pub board_variant: Option<BoardVariant>,
    pub steps: Vec<StepReport>,
    pub live_devices: usize,
    pub live_volumes: usize,
}

impl Report {
    pub fn passed(&self) -> bool {
        self.steps.iter().all(StepReport::passed)
    }

    /// Turn the first failing step into an error.
    pub fn into_result(self) -> Result<Self> {
        match self.steps.iter().find(|step| !step.passed()) {
            Some(step) => Err(TestingError::StepFailed {
                name: self.scenario.clone(),
                step: step.index,
                detail: step.failures.join("; "),
            }),
            None => Ok(self),
        }
    }
}

pub fn run(scenario: &Scenario) -> Result<Report> {
    let config = scenario.platform_config()?;
    let board = SimBoard::new(&config);
    let sim = board.handle();
    scenario.board.apply(&sim);
    reset_insertions();

    tracing::info!("Running scenario '{}'", scenario.name);
    let mut storage = PosixStorage::new(board, config);
    let steps: Vec<StepReport> = scenario
        .steps
        .iter()
        .enumerate()
        .map(|(index, step)| run_step(&mut storage, &sim, index, step))
        .collect();

    let report = Report {
        scenario: scenario.name.clone(),
        board_variant: storage.context().board_variant(),
        steps,
        live_devices: sim.live_devices(),
        live_volumes: sim.live_volumes(),
    };

    if report.passed() {
        tracing::info!("Scenario '{}' passed", scenario.name);
    } else {
        tracing::warn!("Scenario '{}' failed", scenario.name);
    }
    Ok(report)
}

fn call(storage: &mut PosixStorage<SimBoard>, sim: &SimHandle, op: &Operation) -> c_int {
    match *op {
        Operation::Mount { slot, fs, flags } => storage.mount(slot, fs, flags),
        Operation::Mkfs { slot, fs } => storage.mkfs(slot, fs),
        Operation::Umount { slot } => storage.umount(slot),
        Operation::RegisterHotplug { slot, callback } => {
            let callback = callback.then_some(record_insertion as fn());
            storage.register_hotplug_callback(slot, callback)
        }
        Operation::DeregisterHotplug { slot } => storage.deregister_hotplug_callback(slot),
        Operation::PlugUsb { insert } => {
            sim.plug_usb(insert);
            0
        }
        Operation::UnplugUsb => {
            sim.unplug_usb();
            0
        }
        Operation::Inject { fault, status } => {
            sim.inject(fault, status);
            0
        }
    }
}

fn describe(op: &Operation) -> String {
    match op {
        Operation::Mount { slot, fs, flags } => format!("mount {slot} {fs} {flags:?}"),
        Operation::Mkfs { slot, fs } => format!("mkfs {slot} {fs}"),
        Operation::Umount { slot } => format!("umount {slot}"),
        Operation::RegisterHotplug { slot, callback } => {
            format!("register_hotplug {slot} callback={callback}")
        }
        Operation::DeregisterHotplug { slot } => format!("deregister_hotplug {slot}"),
        Operation::PlugUsb { insert } => format!("plug_usb {insert:?}"),
        Operation::UnplugUsb => "unplug_usb".to_string(),
        Operation::Inject { fault, status } => format!("inject {fault:?} {status}"),
    }
}

fn run_step(
    storage: &mut PosixStorage<SimBoard>,
    sim: &SimHandle,
    index: usize,
    step: &Step,
) -> StepReport {
    let errno_before = storage.errno();
    let returned = call(storage, sim, &step.op);
    let errno = storage.errno();
    let mut failures = Vec::new();

    match step.expect.errno() {
        None if returned != 0 => {
            failures.push(format!("expected success, got {returned} with errno {errno}"));
        }
        None if errno != errno_before => {
            failures.push(format!("errno changed from {errno_before} to {errno} on success"));
        }
        None => {}
        Some(_) if returned != -1 => {
            failures.push(format!("expected -1, got {returned}"));
        }
        Some(code) if errno != code => {
            failures.push(format!("expected errno {code}, got {errno}"));
        }
        Some(_) => {}
    }

    let context = storage.context();
    if let Some(slot) = step.op.slot() {
        if let Some(expected) = step.mounted
            && context.is_mounted(slot) != expected
        {
            failures.push(format!("{slot} mounted: expected {expected}"));
        }
        if let Some(expected) = step.device
            && context.has_device(slot) != expected
        {
            failures.push(format!("{slot} device bound: expected {expected}"));
        }
        if let Some(expected) = step.media
            && sim.media(slot) != expected
        {
            failures.push(format!(
                "{slot} media: expected {expected:?}, found {:?}",
                sim.media(slot)
            ));
        }
    }

    if let Some(expected) = step.live_devices
        && sim.live_devices() != expected
    {
        failures.push(format!(
            "live devices: expected {expected}, found {}",
            sim.live_devices()
        ));
    }
    if let Some(expected) = step.live_volumes
        && sim.live_volumes() != expected
    {
        failures.push(format!(
            "live volumes: expected {expected}, found {}",
            sim.live_volumes()
        ));
    }
    if let Some(expected) = step.insertions
        && insertions() != expected
    {
        failures.push(format!(
            "hot-plug callbacks: expected {expected}, found {}",
            insertions()
        ));
    }

    let report = StepReport {
        index,
        operation: describe(&step.op),
        expected: step.expect,
        returned,
        errno,
        failures,
    };
    tracing::debug!("{}", report);
    report
}
