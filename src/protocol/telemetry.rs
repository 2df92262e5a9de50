// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Multi-channel float telemetry over a non-blocking byte sink.
//!
//! The control loop writes samples into numbered channels during a cycle and calls
//! [`Telemetry::send`] once at the end. Channels that were not written since the last frame go out
//! as NaN, which the receiver reads as "no new data".

use log::trace;

use crate::error::{Error, Result};
use crate::protocol::frame::{self, MAX_CHANNELS};
use crate::sink::ByteSink;
use crate::time::Monotonic;

pub struct Telemetry<S, C, const N: usize> {
    sink: S,
    clock: C,
    values: [f32; N],
}

impl<S: ByteSink, C: Monotonic, const N: usize> Telemetry<S, C, N> {
    const CHANNELS_FIT: () = assert!(N <= MAX_CHANNELS, "at most 255 telemetry channels");

    pub fn new(sink: S, clock: C) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::CHANNELS_FIT;

        Self {
            sink,
            clock,
            values: [f32::NAN; N],
        }
    }

    #[inline]
    pub const fn channels(&self) -> usize {
        N
    }

    /// Bytes per frame.
    #[inline]
    pub const fn frame_len(&self) -> usize {
        frame::frame_len(N)
    }

    /// Stage `value` for channel `index` in the next frame.
    pub fn set(&mut self, index: usize, value: f32) -> Result<()> {
        let slot = self
            .values
            .get_mut(index)
            .ok_or(Error::ChannelOutOfRange { index, channels: N })?;
        *slot = value;
        Ok(())
    }

    /// Stage a value for every channel at once.
    pub fn set_all(&mut self, values: &[f32]) -> Result<()> {
        if values.len() != N {
            return Err(Error::LengthMismatch {
                expected: N,
                actual: values.len(),
            });
        }
        self.values.copy_from_slice(values);
        Ok(())
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<f32> {
        self.values.get(index).copied()
    }

    #[inline]
    pub fn values(&self) -> &[f32; N] {
        &self.values
    }

    /// Timestamp and emit one frame, then clear every channel to NaN.
    ///
    /// Each word is handed to the sink separately and nothing is retried. If the sink refuses a
    /// word, the frame on the wire is cut short at that point and the staged values are kept.
    pub fn send(&mut self) -> Result<()> {
        let timestamp = self.clock.now_us();
        let mut written = 0;

        self.write(&frame::tag(N).to_le_bytes(), &mut written)?;
        self.write(&timestamp.to_le_bytes(), &mut written)?;
        let values = self.values;
        for value in values {
            self.write(&value.to_le_bytes(), &mut written)?;
        }

        self.values = [f32::NAN; N];
        Ok(())
    }

    #[inline]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    #[inline]
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn free(self) -> (S, C) {
        (self.sink, self.clock)
    }

    fn write(&mut self, bytes: &[u8], written: &mut usize) -> Result<()> {
        match self.sink.write_bytes(bytes) {
            Ok(()) => {
                *written += bytes.len();
                Ok(())
            }
            Err(e) => {
                trace!("telemetry frame cut after {} bytes: {:?}", written, e);
                Err(Error::SinkWrite { written: *written })
            }
        }
    }
}
