// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Receiver side of the telemetry stream.
//!
//! Bytes are pushed one at a time, typically straight out of a UART receive path. The parser
//! hunts for a frame tag, then reads the timestamp and payload word by word.
//!
//! There is no checksum, so a frame is only trusted once the next tag shows up exactly where the
//! frame should end. Until then it is held back; [`Parser::finish`] releases the last one at the
//! end of a capture. The last four bytes are compared against the tag pattern after every byte, so
//! a tag turning up anywhere inside a frame means the frame was cut short (by the sender) or lost
//! a byte on the line. That frame is dropped and parsing restarts at the new tag.
//!
//! The price is that a frame whose timestamp or payload bytes happen to contain the tag pattern
//! is lost, e.g. a timestamp inside a 256 µs window every ~71.6 minutes.

use core::mem;

use heapless::Vec;
use log::trace;

use crate::protocol::frame::{channels_in, Frame};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum State {
    Hunt,
    Timestamp { channels: usize },
    Payload { channels: usize, timestamp_us: u32 },
    /// Frame complete, waiting for the next tag to confirm it
    Trailer { timestamp_us: u32 },
}

pub struct Parser<const MAX: usize> {
    state: State,
    /// Last four bytes, oldest in the low byte
    word: u32,
    /// Bytes received so far, saturating at 4
    seen: u8,
    /// Bytes of the current field
    filled: u8,
    values: Vec<f32, MAX>,
    resyncs: usize,
}

impl<const MAX: usize> Default for Parser<MAX> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const MAX: usize> Parser<MAX> {
    pub const fn new() -> Self {
        Self {
            state: State::Hunt,
            word: 0,
            seen: 0,
            filled: 0,
            values: Vec::new(),
            resyncs: 0,
        }
    }

    /// Process a single incoming byte. Returns `Some(Frame)` once a frame has been confirmed by
    /// the tag that follows it.
    pub fn push(&mut self, byte: u8) -> Option<Frame<MAX>> {
        self.word = (self.word >> 8) | (u32::from(byte) << 24);
        if self.seen < 4 {
            self.seen += 1;
        }
        if self.seen < 4 {
            return None;
        }
        if self.state != State::Hunt {
            self.filled += 1;
        }

        let next = self.accepts(self.word);
        let aligned = self.filled == 4;

        match self.state {
            State::Hunt => {
                // Slide one byte at a time until a tag lines up
                if let Some(channels) = next {
                    self.begin(channels);
                }
                None
            }
            State::Trailer { timestamp_us } => match next {
                Some(channels) if aligned => {
                    let frame = Frame {
                        timestamp_us,
                        values: mem::take(&mut self.values),
                    };
                    self.begin(channels);
                    Some(frame)
                }
                Some(channels) => {
                    self.drop_frame(timestamp_us);
                    self.begin(channels);
                    None
                }
                None if aligned => {
                    self.drop_frame(timestamp_us);
                    self.state = State::Hunt;
                    None
                }
                None => None,
            },
            State::Timestamp { .. } | State::Payload { .. } if next.is_some() => {
                self.resyncs += 1;
                trace!("telemetry frame cut, resyncing");
                if let Some(channels) = next {
                    self.begin(channels);
                }
                None
            }
            _ if !aligned => None,
            State::Timestamp { channels } => {
                self.filled = 0;
                let timestamp_us = self.word;
                self.state = if channels == 0 {
                    State::Trailer { timestamp_us }
                } else {
                    State::Payload {
                        channels,
                        timestamp_us,
                    }
                };
                None
            }
            State::Payload {
                channels,
                timestamp_us,
            } => {
                self.filled = 0;
                // Cannot overflow: channels <= MAX
                let _ = self.values.push(f32::from_bits(self.word));
                if self.values.len() == channels {
                    self.state = State::Trailer { timestamp_us };
                }
                None
            }
        }
    }

    /// Release a complete frame still waiting for the next tag, at the end of a capture.
    ///
    /// Nothing after the frame vouches for it, so it may be corrupt.
    pub fn finish(&mut self) -> Option<Frame<MAX>> {
        match self.state {
            State::Trailer { timestamp_us } => {
                self.state = State::Hunt;
                self.filled = 0;
                Some(Frame {
                    timestamp_us,
                    values: mem::take(&mut self.values),
                })
            }
            _ => None,
        }
    }

    /// Drop any partial or unconfirmed frame and go back to hunting for a tag.
    pub fn reset(&mut self) {
        self.state = State::Hunt;
        self.filled = 0;
        self.values.clear();
    }

    /// Number of frames dropped because a tag turned up inside them or did not follow them.
    #[inline]
    pub fn resyncs(&self) -> usize {
        self.resyncs
    }

    /// Whether a frame is partially received or waiting to be confirmed.
    #[inline]
    pub fn in_frame(&self) -> bool {
        self.state != State::Hunt
    }

    fn accepts(&self, word: u32) -> Option<usize> {
        channels_in(word).filter(|&channels| channels <= MAX)
    }

    fn begin(&mut self, channels: usize) {
        self.values.clear();
        self.filled = 0;
        self.state = State::Timestamp { channels };
    }

    fn drop_frame(&mut self, timestamp_us: u32) {
        self.resyncs += 1;
        self.values.clear();
        trace!("telemetry frame at {} us not followed by a tag, dropped", timestamp_us);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::frame::{encode_frame, tag};

    fn frame(timestamp_us: u32, values: &[f32]) -> std::vec::Vec<u8> {
        let mut out = [0u8; 256];
        let len = encode_frame(timestamp_us, values, &mut out).unwrap();
        out[..len].to_vec()
    }

    fn feed<const MAX: usize>(parser: &mut Parser<MAX>, bytes: &[u8]) -> std::vec::Vec<Frame<MAX>> {
        let mut frames: std::vec::Vec<_> = bytes.iter().filter_map(|&b| parser.push(b)).collect();
        frames.extend(parser.finish());
        frames
    }

    #[test]
    fn back_to_back_frames() {
        let mut stream = frame(10, &[1.0, 2.0]);
        stream.extend(frame(20, &[3.0, 4.0]));
        stream.extend(frame(30, &[]));

        let mut parser: Parser<4> = Parser::new();
        let frames = feed(&mut parser, &stream);

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].timestamp_us, 10);
        assert_eq!(frames[0].values.as_slice(), &[1.0, 2.0]);
        assert_eq!(frames[1].values.as_slice(), &[3.0, 4.0]);
        assert_eq!(frames[2].timestamp_us, 30);
        assert_eq!(frames[2].channels(), 0);
        assert!(!parser.in_frame());
        assert_eq!(parser.resyncs(), 0);
    }

    #[test]
    fn frame_is_held_until_next_tag() {
        let first = frame(10, &[1.0]);
        let second = frame(20, &[2.0]);
        let mut parser: Parser<4> = Parser::new();

        assert!(first.iter().all(|&b| parser.push(b).is_none()));
        assert!(parser.in_frame());

        let mut released = None;
        for (i, &b) in second[..4].iter().enumerate() {
            released = parser.push(b);
            assert_eq!(released.is_some(), i == 3);
        }
        assert_eq!(released.unwrap().timestamp_us, 10);
    }

    #[test]
    fn skips_leading_garbage() {
        let mut stream = std::vec![0x13, 0xBF, 0xFF, 0x00, 0x7F, 0x55];
        stream.extend(frame(99, &[0.25]));

        let mut parser: Parser<4> = Parser::new();
        let frames = feed(&mut parser, &stream);

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].timestamp_us, 99);
        assert_eq!(frames[0].values.as_slice(), &[0.25]);
    }

    #[test]
    fn resyncs_after_truncated_frame() {
        let first = frame(1, &[1.0, 2.0, 3.0]);
        // Tag, timestamp and one value made it out
        let mut stream = first[..12].to_vec();
        stream.extend(frame(2, &[5.0, 6.0]));

        let mut parser: Parser<4> = Parser::new();
        let frames = feed(&mut parser, &stream);

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].timestamp_us, 2);
        assert_eq!(frames[0].values.as_slice(), &[5.0, 6.0]);
        assert_eq!(parser.resyncs(), 1);
    }

    #[test]
    fn resyncs_after_lone_tag() {
        let mut stream = frame(1, &[1.0])[..4].to_vec();
        stream.extend(frame(2, &[5.0]));
        stream.extend(frame(3, &[6.0]));

        let mut parser: Parser<4> = Parser::new();
        let frames = feed(&mut parser, &stream);

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].timestamp_us, 2);
        assert_eq!(frames[1].values.as_slice(), &[6.0]);
        assert_eq!(parser.resyncs(), 1);
    }

    #[test]
    fn drops_frame_with_lost_byte() {
        let mut stream = frame(1, &[1.0, 2.0, 3.0]);
        stream.remove(10);
        stream.extend(frame(2, &[5.0, 6.0, 7.0]));
        stream.extend(frame(3, &[8.0, 9.0, 10.0]));
        stream.extend(frame(4, &[11.0, 12.0, 13.0]));

        let mut parser: Parser<4> = Parser::new();
        let frames = feed(&mut parser, &stream);

        let stamps: std::vec::Vec<u32> = frames.iter().map(|f| f.timestamp_us).collect();
        assert_eq!(stamps, [2, 3, 4]);
        assert_eq!(frames[0].values.as_slice(), &[5.0, 6.0, 7.0]);
        assert_eq!(parser.resyncs(), 1);
    }

    #[test]
    fn drops_frame_followed_by_garbage() {
        let mut stream = frame(1, &[1.0]);
        stream.extend([0x00, 0x11, 0x22, 0x33]);
        stream.extend(frame(2, &[2.0]));

        let mut parser: Parser<4> = Parser::new();
        let frames = feed(&mut parser, &stream);

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].timestamp_us, 2);
        assert_eq!(parser.resyncs(), 1);
    }

    #[test]
    fn ignores_frames_wider_than_max() {
        let mut stream = frame(1, &[1.0, 2.0, 3.0]);
        stream.extend(frame(2, &[4.0]));

        let mut parser: Parser<2> = Parser::new();
        let frames = feed(&mut parser, &stream);

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].timestamp_us, 2);
        assert_eq!(frames[0].values.as_slice(), &[4.0]);
    }

    #[test]
    fn reset_discards_partial_frame() {
        let stream = frame(7, &[1.0]);
        let mut parser: Parser<2> = Parser::new();

        assert!(stream[..6].iter().all(|&b| parser.push(b).is_none()));
        assert!(parser.in_frame());
        parser.reset();
        assert!(!parser.in_frame());
        assert!(parser.finish().is_none());

        assert_eq!(feed(&mut parser, &stream).len(), 1);
        assert_eq!(tag(1).to_le_bytes(), [0x01, 0xBF, 0xFF, 0x7F]);
    }
}
