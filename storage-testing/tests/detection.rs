// SPDX-License-Identifier: GPL-3.0-only

mod common;

use common::fixtures::context;
use storage_contracts::BoardSupport;
use storage_sys::{PROBE_ROUNDS, detect_board, detect_variant};
use storage_testing::sim::{Media, ProbeWiring, SimBoard};
use storage_types::{BoardOverride, BoardVariant, FilesystemKind, MountFlags, PlatformConfig, Slot};

const STANDARD: [bool; 2] = [true, false];
const MACHINE_CONTROL: [bool; 2] = [true, true];

fn probed_board() -> (PlatformConfig, SimBoard) {
    let config = PlatformConfig::embedded_os_host();
    let board = SimBoard::new(&config);
    (config, board)
}

#[test]
fn one_disagreement_among_six_is_unknown() {
    for odd_round in 0..PROBE_ROUNDS {
        let (_, mut board) = probed_board();
        let sim = board.handle();
        let script = (0..PROBE_ROUNDS).flat_map(|round| {
            if round == odd_round {
                MACHINE_CONTROL
            } else {
                STANDARD
            }
        });
        sim.script_levels(script);

        let (pin, delay) = board.probe_hardware().expect("probe hardware");
        assert_eq!(
            detect_variant(pin, delay),
            BoardVariant::Unknown,
            "disagreement in round {odd_round}"
        );
    }
}

#[test]
fn six_agreeing_probes_give_a_definite_variant() {
    for (wiring, expected) in [
        (ProbeWiring::Floating, BoardVariant::Standard),
        (ProbeWiring::PulledUp, BoardVariant::MachineControl),
    ] {
        let (_, mut board) = probed_board();
        let sim = board.handle();
        sim.set_wiring(wiring);

        let (pin, delay) = board.probe_hardware().expect("probe hardware");
        assert_eq!(detect_variant(pin, delay), expected);
        assert_eq!(sim.with(|state| state.probe_runs), PROBE_ROUNDS);
        // 1 ms + 1 ms + 50 us per round
        assert_eq!(
            sim.with(|state| state.elapsed_ns),
            PROBE_ROUNDS as u64 * 2_050_000
        );
    }
}

#[test]
fn low_after_pull_up_is_unknown() {
    let (_, mut board) = probed_board();
    let sim = board.handle();
    sim.script_levels([false, false].repeat(PROBE_ROUNDS));

    let (pin, delay) = board.probe_hardware().expect("probe hardware");
    assert_eq!(detect_variant(pin, delay), BoardVariant::Unknown);
}

#[test]
fn missing_probe_hardware_is_unknown() {
    let (config, mut board) = probed_board();
    board.handle().set_wiring(ProbeWiring::Absent);

    if storage_sys::BUILD_OVERRIDE.is_none() {
        assert_eq!(
            detect_board(&config, board.probe_hardware()),
            BoardVariant::Unknown
        );
    }
}

#[test]
fn configured_override_skips_probe() {
    let config = PlatformConfig {
        board_override: Some(BoardOverride::MachineControl),
        ..PlatformConfig::embedded_os_host()
    };
    let mut board = SimBoard::new(&config);
    let sim = board.handle();

    assert_eq!(
        detect_board(&config, board.probe_hardware()),
        BoardVariant::MachineControl
    );
    assert_eq!(sim.with(|state| state.probe_runs), 0);
}

#[test]
fn context_probes_only_on_first_mount() {
    let (mut ctx, sim) = context(PlatformConfig::embedded_os_host());
    sim.insert_media(Slot::Usb, Media::Fat);

    ctx.mount(Slot::Usb, FilesystemKind::Fat, MountFlags::Default)
        .expect("mount");
    ctx.unmount(Slot::Usb).expect("unmount");
    let runs = sim.with(|state| state.probe_runs);

    ctx.format(Slot::Usb, FilesystemKind::LittleFs).expect("format");
    ctx.mount(Slot::Usb, FilesystemKind::LittleFs, MountFlags::Default)
        .expect("remount");
    assert_eq!(sim.with(|state| state.probe_runs), runs);
}

#[test]
fn fixed_platform_never_probes() {
    let (mut ctx, sim) = context(PlatformConfig::minimal_host());
    sim.insert_media(Slot::SdCard, Media::Fat);

    ctx.mount(Slot::SdCard, FilesystemKind::Fat, MountFlags::Default)
        .expect("mount");
    assert_eq!(ctx.board_variant(), Some(BoardVariant::Fixed));
    assert_eq!(sim.with(|state| state.probe_runs), 0);
}
