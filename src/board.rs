// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Static board tables for the STM32F767ZI Nucleo board.
//!
//! - [`PIN_TIMERS`] maps a pin to the timer channel it is wired to. Only plain capture/compare
//!   channels are listed; complementary (`CHxN`) outputs and alternate mappings of a pin that is
//!   already present are left out.
//! - [`TICKER_TIMERS`] lists the timers reserved for periodic callbacks. None of them has a pin in
//!   [`PIN_TIMERS`], so tickers never collide with encoders or PWM outputs.
//!
//! TIM5 is not in either table: the firmware runs it as the free-running microsecond clock.

use core::fmt;
use core::str::FromStr;

use crate::error::{Error, Result};

/// Hardware timer number (`TIM1` is `TimerId(1)`).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u8);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TIM{}", self.0)
    }
}

/// A GPIO pin, identified by port letter and pin number (`PE9` is `Pin::new('E', 9)`).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Pin {
    port: u8,
    number: u8,
}

impl Pin {
    pub const fn new(port: char, number: u8) -> Self {
        Self {
            port: port as u8,
            number,
        }
    }

    #[inline]
    pub fn port(&self) -> char {
        self.port as char
    }

    #[inline]
    pub fn number(&self) -> u8 {
        self.number
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}{}", self.port as char, self.number)
    }
}

/// Parse STM pin names such as `"E9"` or `"PE9"`.
impl FromStr for Pin {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = s.as_bytes();
        let bytes = match bytes {
            [b'P', port, _, ..] if port.is_ascii_uppercase() => &bytes[1..],
            _ => bytes,
        };

        let (&port, digits) = bytes.split_first().ok_or(Error::InvalidPinName)?;
        if !(b'A'..=b'K').contains(&port) || digits.is_empty() || digits.len() > 2 {
            return Err(Error::InvalidPinName);
        }

        let mut number: u8 = 0;
        for &d in digits {
            if !d.is_ascii_digit() {
                return Err(Error::InvalidPinName);
            }
            number = number * 10 + (d - b'0');
        }
        if number > 15 {
            return Err(Error::InvalidPinName);
        }

        Ok(Pin::new(port as char, number))
    }
}

/// Timer and capture/compare channel a pin is routed to.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TimerChannel {
    pub timer: TimerId,
    pub channel: u8,
}

const fn tc(port: char, number: u8, timer: u8, channel: u8) -> (Pin, TimerChannel) {
    (
        Pin::new(port, number),
        TimerChannel {
            timer: TimerId(timer),
            channel,
        },
    )
}

/// Pin → `(timer, channel)`.
pub const PIN_TIMERS: &[(Pin, TimerChannel)] = &[
    tc('A', 0, 2, 1),
    tc('A', 1, 2, 2),
    tc('A', 2, 2, 3),
    tc('A', 3, 2, 4),
    tc('A', 5, 2, 1),
    tc('A', 6, 3, 1),
    tc('A', 8, 1, 1),
    tc('A', 9, 1, 2),
    tc('A', 10, 1, 3),
    tc('A', 11, 1, 4),
    tc('A', 15, 2, 1),
    tc('B', 3, 2, 2),
    tc('B', 4, 3, 1),
    tc('B', 5, 3, 2),
    tc('B', 6, 4, 1),
    tc('B', 7, 4, 2),
    tc('B', 8, 4, 3),
    tc('B', 9, 4, 4),
    tc('B', 10, 2, 3),
    tc('B', 11, 2, 4),
    tc('C', 6, 3, 1),
    tc('C', 7, 3, 2),
    tc('C', 8, 3, 3),
    tc('C', 9, 3, 4),
    tc('D', 12, 4, 1),
    tc('D', 13, 4, 2),
    tc('D', 14, 4, 3),
    tc('D', 15, 4, 4),
    tc('E', 5, 9, 1),
    tc('E', 6, 9, 2),
    tc('E', 9, 1, 1),
    tc('E', 11, 1, 2),
    tc('E', 13, 1, 3),
    tc('E', 14, 1, 4),
    tc('F', 6, 10, 1),
    tc('F', 7, 11, 1),
    tc('F', 8, 13, 1),
    tc('F', 9, 14, 1),
];

/// Timers reserved for [`Ticker`](crate::sched::Ticker)s, addressed by logical index.
pub const TICKER_TIMERS: [TimerId; 3] = [TimerId(6), TimerId(7), TimerId(12)];

/// Hardware timers present on the STM32F767.
pub const TIMERS: core::ops::RangeInclusive<u8> = 1..=14;

/// Look up `pin` in an arbitrary pin table.
///
/// A pin listed more than once is a configuration error: the table is never allowed to pick
/// one of the entries silently.
pub fn lookup_pin_in(table: &[(Pin, TimerChannel)], pin: Pin) -> Result<TimerChannel> {
    let mut found = None;
    for (p, tc) in table {
        if *p == pin {
            if found.is_some() {
                return Err(Error::AmbiguousPin(pin));
            }
            found = Some(*tc);
        }
    }
    found.ok_or(Error::UnmappedPin(pin))
}

/// Look up `pin` in [`PIN_TIMERS`].
#[inline]
pub fn lookup_pin(pin: Pin) -> Result<TimerChannel> {
    lookup_pin_in(PIN_TIMERS, pin)
}

/// Resolve a ticker timer id.
///
/// With `use_hardware_id` the id is a raw timer number and only has to exist on the MCU.
/// Otherwise it counts over [`TICKER_TIMERS`].
pub fn resolve_ticker(id: u8, use_hardware_id: bool) -> Result<TimerId> {
    if use_hardware_id {
        if TIMERS.contains(&id) {
            Ok(TimerId(id))
        } else {
            Err(Error::UnknownTimer(id))
        }
    } else {
        TICKER_TIMERS
            .get(id as usize)
            .copied()
            .ok_or(Error::TickerIndex {
                index: id,
                available: TICKER_TIMERS.len(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_table_has_no_duplicates() {
        for (i, (a, _)) in PIN_TIMERS.iter().enumerate() {
            for (b, _) in &PIN_TIMERS[i + 1..] {
                assert_ne!(a, b, "{} listed twice", a);
            }
        }
    }

    #[test]
    fn ticker_timers_have_no_pins() {
        for (pin, tc) in PIN_TIMERS {
            assert!(
                !TICKER_TIMERS.contains(&tc.timer),
                "{} is wired to ticker timer {}",
                pin,
                tc.timer
            );
        }
    }

    #[test]
    fn parse_pin_names() {
        assert_eq!("E9".parse::<Pin>(), Ok(Pin::new('E', 9)));
        assert_eq!("PE9".parse::<Pin>(), Ok(Pin::new('E', 9)));
        assert_eq!("A15".parse::<Pin>(), Ok(Pin::new('A', 15)));
        assert_eq!("PA0".parse::<Pin>(), Ok(Pin::new('A', 0)));
        assert_eq!("A16".parse::<Pin>(), Err(Error::InvalidPinName));
        assert_eq!("Z1".parse::<Pin>(), Err(Error::InvalidPinName));
        assert_eq!("E".parse::<Pin>(), Err(Error::InvalidPinName));
        assert_eq!("".parse::<Pin>(), Err(Error::InvalidPinName));
    }

    #[test]
    fn lookup() {
        let tc = lookup_pin(Pin::new('D', 13)).unwrap();
        assert_eq!(tc.timer, TimerId(4));
        assert_eq!(tc.channel, 2);

        assert_eq!(
            lookup_pin(Pin::new('E', 4)),
            Err(Error::UnmappedPin(Pin::new('E', 4)))
        );
    }

    #[test]
    fn duplicate_entry_is_ambiguous() {
        let table = [tc('B', 6, 4, 1), tc('B', 6, 14, 1)];
        assert_eq!(
            lookup_pin_in(&table, Pin::new('B', 6)),
            Err(Error::AmbiguousPin(Pin::new('B', 6)))
        );
    }

    #[test]
    fn resolve_logical_and_hardware_ids() {
        assert_eq!(resolve_ticker(0, false), Ok(TimerId(6)));
        assert_eq!(resolve_ticker(2, false), Ok(TimerId(12)));
        assert_eq!(
            resolve_ticker(3, false),
            Err(Error::TickerIndex {
                index: 3,
                available: 3
            })
        );
        assert_eq!(resolve_ticker(14, true), Ok(TimerId(14)));
        assert_eq!(resolve_ticker(0, true), Err(Error::UnknownTimer(0)));
        assert_eq!(resolve_ticker(15, true), Err(Error::UnknownTimer(15)));
    }
}
