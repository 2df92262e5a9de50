// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Quadrature encoder position tracking on a 16-bit hardware counter.
//!
//! The timer counts x4 quadrature edges and wraps every 65536 counts. [`Encoder::poll`] reads the
//! counter, compares it with the previous reading and counts a wrap whenever the counter appears
//! to have jumped by more than half its range. The returned position keeps growing (or shrinking)
//! past the counter limits.
//!
//! The unwrap is only correct if the shaft moves less than 32768 counts between two polls. Polling
//! faster is always safe; polling slowly under fast motion silently loses wraps.

use log::debug;

use crate::board::{self, Pin};
use crate::error::{Error, Result};
use crate::timer::{ChannelPin, QuadratureCounter, TimerProvider};

/// Counter period of a 16-bit timer.
pub const MODULUS: i64 = 1 << 16;

/// Sign convention of the reported position.
///
/// Which rotation is "forward" depends on how the encoder is wired to the motor. `Inverted`
/// negates every position going in or out.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Polarity {
    #[default]
    Normal,
    Inverted,
}

pub struct Encoder<C> {
    counter: C,
    /// Counter value on the last poll
    last: u16,
    /// Number of counter wraps (not shaft revolutions)
    wraps: i64,
    polarity: Polarity,
}

impl<C: QuadratureCounter> Encoder<C> {
    /// Configure the timer behind `pin_a`/`pin_b` as an encoder.
    ///
    /// Both pins have to be wired to two different channels of the same timer.
    pub fn new<P>(timers: &mut P, pin_a: Pin, pin_b: Pin) -> Result<Self>
    where
        P: TimerProvider<Counter = C>,
    {
        let a = board::lookup_pin(pin_a)?;
        let b = board::lookup_pin(pin_b)?;

        if a.timer != b.timer {
            return Err(Error::TimerMismatch { a: pin_a, b: pin_b });
        }
        if a.channel == b.channel {
            return Err(Error::SameChannel { a: pin_a, b: pin_b });
        }

        let counter = timers.quadrature(
            a.timer,
            ChannelPin {
                pin: pin_a,
                channel: a.channel,
            },
            ChannelPin {
                pin: pin_b,
                channel: b.channel,
            },
        )?;

        debug!("encoder on {} ({} / {})", a.timer, pin_a, pin_b);

        Ok(Self::from_counter(counter))
    }

    /// Track an already configured counter, starting from its current value.
    pub fn from_counter(counter: C) -> Self {
        let last = counter.count();
        Self {
            counter,
            last,
            wraps: 0,
            polarity: Polarity::Normal,
        }
    }

    pub fn with_polarity(mut self, polarity: Polarity) -> Self {
        self.polarity = polarity;
        self
    }

    /// Read the counter and return the unwrapped pulse count.
    pub fn poll(&mut self) -> i64 {
        let raw = self.counter.count();

        // A jump of more than half the range means the counter wrapped
        let diff = i64::from(raw) - i64::from(self.last);
        if 2 * diff.abs() > MODULUS {
            if diff < 0 {
                // Counter suddenly low: overflowed upwards
                self.wraps += 1;
            } else {
                // Counter suddenly high: underflowed
                self.wraps -= 1;
            }
        }

        self.last = raw;
        self.position()
    }

    /// Position as of the last poll, without touching the hardware.
    #[inline]
    pub fn position(&self) -> i64 {
        self.oriented(i64::from(self.last) + self.wraps * MODULUS)
    }

    /// Make the current shaft position read as `value`.
    pub fn reset_to(&mut self, value: i64) {
        let value = self.oriented(value);
        let raw = value.rem_euclid(MODULUS) as u16;

        self.counter.set_count(raw);
        self.last = raw;
        self.wraps = value.div_euclid(MODULUS);
    }

    #[inline]
    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Raw counter value seen by the last poll.
    #[inline]
    pub fn raw(&self) -> u16 {
        self.last
    }

    #[inline]
    pub fn wraps(&self) -> i64 {
        self.wraps
    }

    /// Consume the wrapper and return the underlying counter.
    #[inline]
    pub fn free(self) -> C {
        self.counter
    }

    #[inline]
    fn oriented(&self, value: i64) -> i64 {
        match self.polarity {
            Polarity::Normal => value,
            Polarity::Inverted => value.wrapping_neg(),
        }
    }
}
