// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Telemetry frame layout.
//!
//! Every frame is a sequence of little-endian 32-bit words:
//!
//! | Word      | Contents |
//! | --------- | -------- |
//! | 0         | `IDENTIFIER ^ channels` |
//! | 1         | timestamp in µs (`u32`, wraps after ~71.6 min) |
//! | 2 ..      | one IEEE-754 `f32` per channel, in channel order; NaN = no new data |
//!
//! There is no checksum and no retransmission. A receiver finds frame starts by matching the upper
//! 24 bits of a word against [`IDENTIFIER`]. Read as an `f32` the identifier is a NaN with a
//! non-canonical payload, so it does not collide with ordinary samples.

use heapless::Vec;

/// Frame identifier. The low byte carries the channel count.
pub const IDENTIFIER: u32 = 0x7FFF_BF00;

/// Identifier and timestamp words.
pub const HEADER_LEN: usize = 8;

/// Largest channel count the identifier's low byte can carry.
pub const MAX_CHANNELS: usize = 0xFF;

/// First word of a frame with `channels` channels.
#[inline]
pub const fn tag(channels: usize) -> u32 {
    IDENTIFIER ^ channels as u32
}

/// Channel count encoded in `word`, if it is a frame tag.
#[inline]
pub const fn channels_in(word: u32) -> Option<usize> {
    if word & !0xFF == IDENTIFIER {
        Some((word ^ IDENTIFIER) as usize)
    } else {
        None
    }
}

/// Total encoded size of a frame.
#[inline]
pub const fn frame_len(channels: usize) -> usize {
    HEADER_LEN + 4 * channels
}

/// A decoded frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame<const MAX: usize> {
    pub timestamp_us: u32,
    pub values: Vec<f32, MAX>,
}

impl<const MAX: usize> Frame<MAX> {
    #[inline]
    pub fn channels(&self) -> usize {
        self.values.len()
    }
}

/// Encode one frame into `out` and return its length, or `None` if `out` is too short or there
/// are more than [`MAX_CHANNELS`] values.
pub fn encode_frame(timestamp_us: u32, values: &[f32], out: &mut [u8]) -> Option<usize> {
    let len = frame_len(values.len());
    if values.len() > MAX_CHANNELS || out.len() < len {
        return None;
    }

    out[0..4].copy_from_slice(&tag(values.len()).to_le_bytes());
    out[4..8].copy_from_slice(&timestamp_us.to_le_bytes());
    for (chunk, value) in out[HEADER_LEN..len].chunks_exact_mut(4).zip(values) {
        chunk.copy_from_slice(&value.to_le_bytes());
    }

    Some(len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_round_trip() {
        assert_eq!(tag(0), 0x7FFF_BF00);
        assert_eq!(tag(2), 0x7FFF_BF02);
        assert_eq!(channels_in(tag(200)), Some(200));
        assert_eq!(channels_in(0x7FFF_BE02), None);
        assert!(f32::from_bits(IDENTIFIER).is_nan());
    }

    #[test]
    fn encode_layout() {
        let mut out = [0u8; 16];
        assert_eq!(encode_frame(1000, &[3.0, -1.0], &mut out), Some(16));
        assert_eq!(&out[0..4], &[0x02, 0xBF, 0xFF, 0x7F]);
        assert_eq!(&out[4..8], &1000u32.to_le_bytes());
        assert_eq!(&out[8..12], &3.0f32.to_le_bytes());
        assert_eq!(&out[12..16], &(-1.0f32).to_le_bytes());

        assert_eq!(encode_frame(1000, &[3.0, -1.0, 0.5], &mut out), None);
    }
}
