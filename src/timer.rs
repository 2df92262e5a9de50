// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Interface to the hardware timer driver.
//!
//! The core never touches timer registers itself. A board crate implements these traits for its
//! peripherals (see `firmware/src/hw/timers.rs` for the STM32F7 version) and the tests implement
//! them for a simulated board.

use crate::board::{Pin, TimerId};
use crate::error::{Error, Result};

/// Something that reacts to a timer interrupt.
///
/// `on_interrupt` runs in interrupt context: it must be O(1), must not allocate and must not
/// block.
pub trait Interrupt: Sync {
    fn on_interrupt(&'static self);
}

/// A timer configured to fire its update interrupt at a fixed frequency.
pub trait PeriodicTimer {
    fn id(&self) -> TimerId;

    /// Route the timer's interrupt to `handler` and enable it. Replaces any previous handler.
    fn attach(&mut self, handler: &'static dyn Interrupt);

    /// Disable the interrupt, forget the handler and halt the counter.
    fn detach_all(&mut self);
}

/// A 16-bit hardware counter in quadrature (encoder) mode.
pub trait QuadratureCounter {
    fn count(&self) -> u16;
    fn set_count(&mut self, count: u16);
}

/// One encoder input: the pin and the capture channel it drives.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ChannelPin {
    pub pin: Pin,
    pub channel: u8,
}

/// Hands out timer peripherals.
///
/// Each timer can be claimed once; a second claim for the same id fails with
/// [`Error::TimerBusy`](crate::Error::TimerBusy), an id the board does not have with
/// [`Error::UnknownTimer`](crate::Error::UnknownTimer).
pub trait TimerProvider {
    type Periodic: PeriodicTimer;
    type Counter: QuadratureCounter;

    /// Claim `id` and set its update rate to `freq_hz`. No interrupt is attached yet.
    fn periodic(&mut self, id: TimerId, freq_hz: f32) -> Result<Self::Periodic>;

    /// Claim `id` and configure it for x4 quadrature decoding over the full 16-bit range with
    /// both inputs attached.
    fn quadrature(&mut self, id: TimerId, a: ChannelPin, b: ChannelPin) -> Result<Self::Counter>;
}

/// Prescaler and auto-reload values for an update rate of `freq_hz` on a timer clocked at
/// `clock_hz`, as `(PSC, ARR)` register values.
///
/// The prescaler is kept as small as possible so the reload value, and with it the frequency
/// resolution, stays large.
pub fn prescaler(clock_hz: u32, freq_hz: f32) -> Result<(u16, u16)> {
    if !(freq_hz.is_finite() && freq_hz > 0.0) {
        return Err(Error::InvalidFrequency);
    }

    let ticks = f64::from(clock_hz) / f64::from(freq_hz) + 0.5;
    if !(2.0..=4_294_967_296.0).contains(&ticks) {
        return Err(Error::InvalidFrequency);
    }

    let ticks = ticks as u64;
    let psc = (ticks - 1) >> 16;
    let arr = ticks / (psc + 1) - 1;
    Ok((psc as u16, arr as u16))
}
