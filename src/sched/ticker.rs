// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Periodic callbacks driven by a hardware timer.
//!
//! A [`Ticker`] claims one timer and runs a plain `fn()` at a fixed rate. The timer interrupt
//! never calls the function itself: it only queues the ticker on a [`Scheduler`], and the callback
//! runs the next time the main loop drains that queue.
//!
//! The ticker is not started on construction. Because the interrupt keeps a reference to it, a
//! ticker has to live for `'static` before it can be started:
//!
//! ```ignore
//! static DEFERRED: DeferQueue<8> = DeferQueue::new();
//!
//! let ticker = Ticker::new(&mut timers, 0, 100.0, control_loop, &DEFERRED, TickerOptions::new())?;
//! let ticker = cortex_m::singleton!(: Ticker<PeriodicTim> = ticker).unwrap();
//! ticker.start();
//! ```

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use critical_section::Mutex;
use log::debug;

use super::defer::{Scheduler, Task};
use super::reclaim::{Hold, Reclaimer};
use crate::board::{self, TimerId};
use crate::error::{Error, Result};
use crate::timer::{Interrupt, PeriodicTimer, TimerProvider};

/// Per-binding options.
#[derive(Copy, Clone, Default)]
pub struct TickerOptions {
    use_hardware_id: bool,
    reclaim: Option<&'static Reclaimer>,
}

impl TickerOptions {
    pub const fn new() -> Self {
        Self {
            use_hardware_id: false,
            reclaim: None,
        }
    }

    /// Treat the id as a raw timer number instead of an index into
    /// [`TICKER_TIMERS`](crate::board::TICKER_TIMERS).
    pub const fn use_hardware_id(mut self, yes: bool) -> Self {
        self.use_hardware_id = yes;
        self
    }

    /// Suspend background reclamation on `reclaimer` while this binding exists and run a pass
    /// after every callback instead. Intended for the ticker that runs the main loop.
    ///
    /// Background reclamation resumes once the ticker is freed or dropped.
    pub const fn reclaim_at_end(mut self, reclaimer: &'static Reclaimer) -> Self {
        self.reclaim = Some(reclaimer);
        self
    }
}

pub struct Ticker<T> {
    id: TimerId,
    freq_hz: f32,
    callback: fn(),
    reclaim: Option<Hold>,
    scheduler: &'static dyn Scheduler,
    timer: Mutex<RefCell<T>>,
    running: AtomicBool,
}

impl<T> Ticker<T>
where
    T: PeriodicTimer + Send + 'static,
{
    /// Claim a timer and configure it to tick at `freq_hz`.
    ///
    /// No interrupt handler is attached until [`start`](Self::start).
    pub fn new<P>(
        timers: &mut P,
        id: u8,
        freq_hz: f32,
        callback: fn(),
        scheduler: &'static dyn Scheduler,
        options: TickerOptions,
    ) -> Result<Self>
    where
        P: TimerProvider<Periodic = T>,
    {
        let timer_id = board::resolve_ticker(id, options.use_hardware_id)?;

        if !(freq_hz.is_finite() && freq_hz > 0.0) {
            return Err(Error::InvalidFrequency);
        }

        let timer = timers.periodic(timer_id, freq_hz)?;
        let reclaim = options.reclaim.map(Reclaimer::hold);

        debug!("ticker bound to {} at {} Hz", timer_id, freq_hz);

        Ok(Self {
            id: timer_id,
            freq_hz,
            callback,
            reclaim,
            scheduler,
            timer: Mutex::new(RefCell::new(timer)),
            running: AtomicBool::new(false),
        })
    }

    /// Attach the interrupt handler. Calling this again replaces the previous attachment.
    pub fn start(&'static self) {
        self.running.store(true, Ordering::Release);
        critical_section::with(|cs| self.timer.borrow_ref_mut(cs).attach(self));
        debug!("ticker on {} started", self.id);
    }

    /// Detach the interrupt handler.
    ///
    /// A callback that was already queued before the call still runs.
    pub fn stop(&self) {
        critical_section::with(|cs| self.timer.borrow_ref_mut(cs).detach_all());
        self.running.store(false, Ordering::Release);
        debug!("ticker on {} stopped", self.id);
    }

    /// Stop the ticker, end its reclamation policy and return the timer.
    pub fn free(self) -> T {
        self.stop();
        self.timer.into_inner().into_inner()
    }

    #[inline]
    pub fn timer_id(&self) -> TimerId {
        self.id
    }

    #[inline]
    pub fn frequency(&self) -> f32 {
        self.freq_hz
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl<T> Interrupt for Ticker<T>
where
    T: PeriodicTimer + Send + 'static,
{
    /// Queue the callback. Nothing else happens in interrupt context.
    fn on_interrupt(&'static self) {
        if self.running.load(Ordering::Acquire) {
            // A full queue drops this tick; the queue counts it.
            let _ = self.scheduler.schedule(self);
        }
    }
}

impl<T> Task for Ticker<T>
where
    T: PeriodicTimer + Send + 'static,
{
    fn run(&self) {
        (self.callback)();

        if let Some(hold) = &self.reclaim {
            hold.reclaimer().collect();
        }
    }
}
