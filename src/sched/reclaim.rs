// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! End-of-callback reclamation.
//!
//! A [`Reclaimer`] wraps an application-defined reclamation pass, e.g. resetting a scratch pool
//! that the control loop fills every cycle. Normally the idle loop runs the pass in the background
//! via [`Reclaimer::background_pass`]. A [`Ticker`](super::Ticker) built with
//! [`TickerOptions::reclaim_at_end`](super::TickerOptions::reclaim_at_end) suspends that and runs
//! the pass right after each callback instead, so reclamation always happens at the same point of
//! the loop.
//!
//! The background flag is shared by everything holding the same `Reclaimer`. Binding two tickers
//! to one reclaimer makes them toggle the same flag; keep a single "main loop" ticker per
//! reclaimer.

use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub struct Reclaimer {
    pass: fn(),
    background: AtomicBool,
    passes: AtomicUsize,
}

impl Reclaimer {
    pub const fn new(pass: fn()) -> Self {
        Self {
            pass,
            background: AtomicBool::new(true),
            passes: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub fn suspend_background(&self) {
        self.background.store(false, Ordering::Release);
    }

    #[inline]
    pub fn resume_background(&self) {
        self.background.store(true, Ordering::Release);
    }

    /// Suspend background reclamation until the returned guard is dropped.
    pub fn hold(&'static self) -> Hold {
        self.suspend_background();
        Hold(self)
    }

    #[inline]
    pub fn is_background_enabled(&self) -> bool {
        self.background.load(Ordering::Acquire)
    }

    /// Run the reclamation pass now.
    pub fn collect(&self) {
        (self.pass)();
        self.passes.fetch_add(1, Ordering::Relaxed);
    }

    /// Idle-loop hook. Runs a pass only while background reclamation is enabled.
    pub fn background_pass(&self) -> bool {
        if self.is_background_enabled() {
            self.collect();
            true
        } else {
            false
        }
    }

    /// Number of passes run so far.
    pub fn passes(&self) -> usize {
        self.passes.load(Ordering::Relaxed)
    }
}

/// Keeps background reclamation suspended while alive.
pub struct Hold(&'static Reclaimer);

impl Hold {
    #[inline]
    pub fn reclaimer(&self) -> &'static Reclaimer {
        self.0
    }
}

impl Drop for Hold {
    fn drop(&mut self) {
        self.0.resume_background();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_pass_follows_flag() {
        static RECLAIM: Reclaimer = Reclaimer::new(|| {});

        assert!(RECLAIM.background_pass());
        RECLAIM.suspend_background();
        assert!(!RECLAIM.background_pass());
        RECLAIM.collect();
        RECLAIM.resume_background();
        assert!(RECLAIM.background_pass());
        assert_eq!(RECLAIM.passes(), 3);
    }
}
