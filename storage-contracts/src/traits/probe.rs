// SPDX-License-Identifier: GPL-3.0-only

use embedded_hal::digital::InputPin;

/// Internal bias applied to the probe input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull {
    Up,
    Down,
    None,
}

/// Input pin whose internal pull resistor can be switched at runtime
pub trait ProbePin: InputPin {
    fn set_pull(&mut self, pull: Pull);
}
