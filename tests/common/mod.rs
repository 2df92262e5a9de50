// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Simulated board for host tests: timers whose "vector" is called by hand, counters driven by a
//! virtual shaft, and a settable microsecond clock.

#![allow(dead_code)]

use std::boxed::Box;
use std::cell::Cell;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};

use critical_section::Mutex;

use rtio::board::{TimerId, TIMERS};
use rtio::encoder::MODULUS;
use rtio::time::Monotonic;
use rtio::timer::{ChannelPin, Interrupt, PeriodicTimer, QuadratureCounter, TimerProvider};
use rtio::{Error, Result};

pub type Slot = Mutex<Cell<Option<&'static dyn Interrupt>>>;

pub fn leak<T>(value: T) -> &'static T {
    Box::leak(Box::new(value))
}

pub struct SimTimer {
    id: TimerId,
    slot: &'static Slot,
}

impl PeriodicTimer for SimTimer {
    fn id(&self) -> TimerId {
        self.id
    }

    fn attach(&mut self, handler: &'static dyn Interrupt) {
        critical_section::with(|cs| self.slot.borrow(cs).set(Some(handler)));
    }

    fn detach_all(&mut self) {
        critical_section::with(|cs| self.slot.borrow(cs).set(None));
    }
}

/// Counter that follows a shaft position in x4 counts.
pub struct SimCounter {
    shaft: &'static AtomicI64,
}

impl QuadratureCounter for SimCounter {
    fn count(&self) -> u16 {
        self.shaft.load(Ordering::SeqCst).rem_euclid(MODULUS) as u16
    }

    fn set_count(&mut self, count: u16) {
        self.shaft.store(i64::from(count), Ordering::SeqCst);
    }
}

pub struct SimBoard {
    slots: &'static [Slot; 16],
    claimed: Vec<TimerId>,
    shafts: Vec<(TimerId, &'static AtomicI64)>,
    freqs: Vec<(TimerId, f32)>,
}

impl SimBoard {
    pub fn new() -> Self {
        Self {
            slots: leak(core::array::from_fn(|_| Mutex::new(Cell::new(None)))),
            claimed: Vec::new(),
            shafts: Vec::new(),
            freqs: Vec::new(),
        }
    }

    /// Shaft wired to timer `id`, created on first use.
    pub fn shaft(&mut self, id: TimerId) -> &'static AtomicI64 {
        if let Some(&(_, shaft)) = self.shafts.iter().find(|(t, _)| *t == id) {
            return shaft;
        }
        let shaft = leak(AtomicI64::new(0));
        self.shafts.push((id, shaft));
        shaft
    }

    /// Run timer `id`'s interrupt vector. Returns `false` if nothing is attached.
    pub fn fire(&self, id: TimerId) -> bool {
        let handler = critical_section::with(|cs| self.slots[id.0 as usize].borrow(cs).get());
        match handler {
            Some(handler) => {
                handler.on_interrupt();
                true
            }
            None => false,
        }
    }

    pub fn frequency(&self, id: TimerId) -> Option<f32> {
        self.freqs.iter().find(|(t, _)| *t == id).map(|(_, f)| *f)
    }

    fn claim(&mut self, id: TimerId) -> Result<()> {
        if !TIMERS.contains(&id.0) {
            return Err(Error::UnknownTimer(id.0));
        }
        if self.claimed.contains(&id) {
            return Err(Error::TimerBusy(id.0));
        }
        self.claimed.push(id);
        Ok(())
    }
}

impl TimerProvider for SimBoard {
    type Periodic = SimTimer;
    type Counter = SimCounter;

    fn periodic(&mut self, id: TimerId, freq_hz: f32) -> Result<SimTimer> {
        self.claim(id)?;
        self.freqs.push((id, freq_hz));
        let slots = self.slots;
        Ok(SimTimer {
            id,
            slot: &slots[id.0 as usize],
        })
    }

    fn quadrature(&mut self, id: TimerId, _a: ChannelPin, _b: ChannelPin) -> Result<SimCounter> {
        self.claim(id)?;
        Ok(SimCounter {
            shaft: self.shaft(id),
        })
    }
}

/// Settable microsecond clock.
#[derive(Copy, Clone)]
pub struct SimClock(&'static AtomicU32);

impl SimClock {
    pub fn new(start_us: u32) -> Self {
        SimClock(leak(AtomicU32::new(start_us)))
    }

    pub fn advance(&self, us: u32) {
        let now = self.0.load(Ordering::SeqCst);
        self.0.store(now.wrapping_add(us), Ordering::SeqCst);
    }
}

impl Monotonic for SimClock {
    fn now_us(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }
}
