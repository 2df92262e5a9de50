// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Microsecond timestamps and elapsed-time measurement.
//!
//! Timestamps are `u32` microseconds and wrap after 2^32 µs (about 71.6 minutes). Differences are
//! taken with wrapping arithmetic, so intervals shorter than that are always correct.

/// Free-running microsecond clock.
pub trait Monotonic {
    fn now_us(&self) -> u32;
}

impl<F: Fn() -> u32> Monotonic for F {
    #[inline]
    fn now_us(&self) -> u32 {
        self()
    }
}

/// tic/toc style elapsed-time measurement.
///
/// ```
/// use rtio::time::Stopwatch;
///
/// let clock = || 1_000u32;
/// let mut sw = Stopwatch::new(clock);
/// sw.tic();
/// assert_eq!(sw.toc(), 0);
/// ```
pub struct Stopwatch<C> {
    clock: C,
    start: u32,
}

impl<C: Monotonic> Stopwatch<C> {
    pub fn new(clock: C) -> Self {
        let start = clock.now_us();
        Self { clock, start }
    }

    /// Start a measurement.
    #[inline]
    pub fn tic(&mut self) {
        self.start = self.clock.now_us();
    }

    /// Microseconds since the last [`tic`](Self::tic).
    #[inline]
    pub fn toc(&self) -> u32 {
        self.clock.now_us().wrapping_sub(self.start)
    }

    /// Like [`toc`](Self::toc), but restarts the measurement.
    pub fn lap(&mut self) -> u32 {
        let now = self.clock.now_us();
        let elapsed = now.wrapping_sub(self.start);
        self.start = now;
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn measures_across_wraparound() {
        let now = Cell::new(u32::MAX - 99);
        let mut sw = Stopwatch::new(|| now.get());

        sw.tic();
        now.set(now.get().wrapping_add(250));
        assert_eq!(sw.toc(), 250);

        now.set(now.get().wrapping_add(50));
        assert_eq!(sw.lap(), 300);
        assert_eq!(sw.toc(), 0);
    }
}
