// SPDX-License-Identifier: GPL-3.0-only

//! Board variant detection on the VBUS sense pin
//!
//! The industrial controller has an external pull-up on the pin, so it never
//! floats and always reads high. The plain carrier board leaves the pin
//! floating: after a short injection through the internal pull resistor it
//! keeps the injected level long enough to be read back.
//!
//! WARNING: the timing and the repetition count below were validated against
//! radiated interference from a chattering relay. Re-run that test before
//! changing either.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;
use storage_contracts::{ProbePin, Pull};
use storage_types::{BoardOverride, BoardVariant, Capability, PlatformConfig};

/// Total number of single-shot probes that must agree
pub const PROBE_ROUNDS: usize = 6;

const SETTLE_MS: u32 = 1;

/// Time for the external pull-up to lift a floated pin back to a valid high
const RECHARGE_US: u32 = 50;

/// Variant forced through cargo features, if any
pub const BUILD_OVERRIDE: Option<BoardOverride> = if cfg!(feature = "override-standard") {
    Some(BoardOverride::Standard)
} else if cfg!(feature = "override-machine-control") {
    Some(BoardOverride::MachineControl)
} else {
    None
};

/// One probe cycle: inject high, read; inject low, read after recharge.
pub fn probe_once<P, D>(pin: &mut P, delay: &mut D) -> BoardVariant
where
    P: ProbePin,
    D: DelayNs,
{
    pin.set_pull(Pull::Up);
    delay.delay_ms(SETTLE_MS);
    pin.set_pull(Pull::None);
    let after_up = pin.is_high();

    pin.set_pull(Pull::Down);
    delay.delay_ms(SETTLE_MS);
    pin.set_pull(Pull::None);
    delay.delay_us(RECHARGE_US);
    let after_down = pin.is_high();

    // Leave the input biased instead of floating
    pin.set_pull(Pull::Up);

    match (after_up, after_down) {
        (Ok(true), Ok(false)) => BoardVariant::Standard,
        (Ok(true), Ok(true)) => BoardVariant::MachineControl,
        _ => BoardVariant::Unknown,
    }
}

/// Repeat the probe [`PROBE_ROUNDS`] times. Any disagreement yields `Unknown`.
pub fn detect_variant<P, D>(pin: &mut P, delay: &mut D) -> BoardVariant
where
    P: ProbePin,
    D: DelayNs,
{
    let first = probe_once(pin, delay);

    for round in 1..PROBE_ROUNDS {
        let next = probe_once(pin, delay);
        if next != first {
            tracing::warn!(
                "Board probe disagreed in round {}: {:?} then {:?}",
                round,
                first,
                next
            );
            return BoardVariant::Unknown;
        }
    }

    first
}

/// Establish the board variant for a platform.
///
/// Platforms without the probe capability are identified at build time and
/// report `Fixed`. A configured override wins over the build-time one, and
/// either skips the electrical probe entirely.
pub fn detect_board<P, D>(
    config: &PlatformConfig,
    hardware: Option<(&mut P, &mut D)>,
) -> BoardVariant
where
    P: ProbePin,
    D: DelayNs,
{
    if !config.capabilities().contains(Capability::BoardProbe) {
        return BoardVariant::Fixed;
    }

    if let Some(forced) = config.board_override.or(BUILD_OVERRIDE) {
        tracing::debug!("Board variant forced to {:?}", forced);
        return forced.into();
    }

    let Some((pin, delay)) = hardware else {
        tracing::warn!("Board probe requested but no probe hardware is available");
        return BoardVariant::Unknown;
    };

    let variant = detect_variant(pin, delay);
    tracing::info!("Detected board variant: {:?}", variant);
    variant
}
