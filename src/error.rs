// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Crate-wide error type.
//!
//! Setup failures (bad timer ids, pins, frequencies) and malformed channel access are reported
//! synchronously. Interrupt-side failures never show up here: a dropped deferral request is only
//! counted by [`DeferQueue`](crate::sched::DeferQueue).

use crate::board::Pin;

pub type Result<T> = core::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Invalid timer id, frequency or pin-to-timer mapping.
    Configuration,
    /// Channel index outside `[0, channels)`.
    Index,
    /// Bulk set with the wrong number of values.
    LengthMismatch,
    /// The byte sink refused (part of) a frame.
    SinkWrite,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("timer {0} does not exist on this board")]
    UnknownTimer(u8),

    #[error("ticker index {index} exceeds the {available} available ticker timers")]
    TickerIndex { index: u8, available: usize },

    #[error("timer {0} is already bound")]
    TimerBusy(u8),

    #[error("frequency must be finite and greater than zero")]
    InvalidFrequency,

    #[error("not a valid pin name")]
    InvalidPinName,

    #[error("pin {0} is not connected to a hardware timer")]
    UnmappedPin(Pin),

    #[error("pin {0} has more than one timer channel entry")]
    AmbiguousPin(Pin),

    #[error("pins {a} and {b} are not connected to the same hardware timer")]
    TimerMismatch { a: Pin, b: Pin },

    #[error("pin {0} is not on channel 1 or 2 of its timer and cannot drive encoder mode")]
    NotEncoderChannel(Pin),

    #[error("pins {a} and {b} are on the same timer channel")]
    SameChannel { a: Pin, b: Pin },

    #[error("channel {index} is out of range for {channels} channels")]
    ChannelOutOfRange { index: usize, channels: usize },

    #[error("{expected} channels were configured, but {actual} values were given")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("byte sink rejected the frame after {written} bytes")]
    SinkWrite { written: usize },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnknownTimer(_)
            | Error::TickerIndex { .. }
            | Error::TimerBusy(_)
            | Error::InvalidFrequency
            | Error::InvalidPinName
            | Error::UnmappedPin(_)
            | Error::AmbiguousPin(_)
            | Error::TimerMismatch { .. }
            | Error::NotEncoderChannel(_)
            | Error::SameChannel { .. } => ErrorKind::Configuration,
            Error::ChannelOutOfRange { .. } => ErrorKind::Index,
            Error::LengthMismatch { .. } => ErrorKind::LengthMismatch,
            Error::SinkWrite { .. } => ErrorKind::SinkWrite,
        }
    }
}
