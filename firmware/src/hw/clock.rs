// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Microsecond time base on TIM5.
//!
//! TIM5 is one of the two 32-bit timers. Prescaled to 1 MHz and left free-running over the full
//! 32-bit range, its counter is directly the `u32` microsecond timestamp used by telemetry frames.

use rtio::time::Monotonic;
use stm32f7xx_hal::{pac, rcc::Clocks};

/// Handle to the running TIM5 counter. Copies all read the same hardware counter.
#[derive(Copy, Clone)]
pub struct Micros {
    _tim: (),
}

impl Micros {
    /// Configure TIM5 as a 1 MHz free-running counter. The TIM5 clock must already be enabled.
    pub fn start(tim5: pac::TIM5, clocks: &Clocks) -> Self {
        let tim = tim5;
        let psc = clocks.timclk1().raw() / 1_000_000 - 1;

        // Disable counter while configuring
        tim.cr1.modify(|_, w| w.cen().clear_bit());

        tim.psc.write(|w| unsafe { w.bits(psc) });

        // Auto-reload: max 32-bit
        tim.arr.write(|w| unsafe { w.bits(0xFFFF_FFFF) });

        // Load the prescaler now rather than at the first overflow
        tim.egr.write(|w| w.ug().set_bit());

        tim.cnt.write(|w| unsafe { w.bits(0) });
        tim.cr1.modify(|_, w| w.cen().set_bit());

        Self { _tim: () }
    }
}

impl Monotonic for Micros {
    #[inline]
    fn now_us(&self) -> u32 {
        // SAFETY: read-only access to a counter configured once in `start`
        unsafe { (*pac::TIM5::ptr()).cnt.read().bits() }
    }
}
