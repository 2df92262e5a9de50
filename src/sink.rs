// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Non-blocking byte sinks.
//!
//! [`ByteSink::write_bytes`] returns immediately: either the bytes were accepted or the sink
//! reports [`nb::Error::WouldBlock`]. Callers in this crate never spin on `WouldBlock`.
//!
//! [`TxQueue`] is the sink used for the telemetry UART: the control loop pushes into it and the
//! UART transmit interrupt pops one byte at a time.

use core::cell::RefCell;
use core::convert::Infallible;

use critical_section::Mutex;
use heapless::Deque;

pub trait ByteSink {
    type Error: core::fmt::Debug;

    /// Accept all of `bytes` or none of them.
    fn write_bytes(&mut self, bytes: &[u8]) -> nb::Result<(), Self::Error>;
}

impl<S: ByteSink + ?Sized> ByteSink for &mut S {
    type Error = S::Error;

    #[inline]
    fn write_bytes(&mut self, bytes: &[u8]) -> nb::Result<(), Self::Error> {
        (**self).write_bytes(bytes)
    }
}

impl<const N: usize> ByteSink for heapless::Vec<u8, N> {
    type Error = Infallible;

    fn write_bytes(&mut self, bytes: &[u8]) -> nb::Result<(), Infallible> {
        self.extend_from_slice(bytes)
            .map_err(|_| nb::Error::WouldBlock)
    }
}

/// Interrupt-safe transmit ring buffer.
pub struct TxQueue<const CAP: usize> {
    bytes: Mutex<RefCell<Deque<u8, CAP>>>,
}

impl<const CAP: usize> Default for TxQueue<CAP> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const CAP: usize> TxQueue<CAP> {
    pub const fn new() -> Self {
        Self {
            bytes: Mutex::new(RefCell::new(Deque::new())),
        }
    }

    /// Append `data` if it fits completely. Returns `false` and leaves the queue untouched
    /// otherwise.
    pub fn push_slice(&self, data: &[u8]) -> bool {
        critical_section::with(|cs| {
            let mut q = self.bytes.borrow_ref_mut(cs);
            if CAP - q.len() < data.len() {
                return false;
            }
            for &b in data {
                // Cannot fail, space was checked above
                let _ = q.push_back(b);
            }
            true
        })
    }

    /// Take the oldest byte. Called from the transmit interrupt.
    #[inline]
    pub fn pop(&self) -> Option<u8> {
        critical_section::with(|cs| self.bytes.borrow_ref_mut(cs).pop_front())
    }

    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.bytes.borrow_ref(cs).len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn free_space(&self) -> usize {
        CAP - self.len()
    }

    pub fn clear(&self) {
        critical_section::with(|cs| self.bytes.borrow_ref_mut(cs).clear());
    }
}

impl<const CAP: usize> ByteSink for &TxQueue<CAP> {
    type Error = Infallible;

    fn write_bytes(&mut self, bytes: &[u8]) -> nb::Result<(), Infallible> {
        if self.push_slice(bytes) {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_or_nothing() {
        let queue: TxQueue<6> = TxQueue::new();
        let mut sink = &queue;

        assert_eq!(sink.write_bytes(&[1, 2, 3, 4]), Ok(()));
        assert_eq!(sink.write_bytes(&[5, 6, 7]), Err(nb::Error::WouldBlock));
        assert_eq!(queue.len(), 4);
        assert_eq!(queue.free_space(), 2);

        assert_eq!(sink.write_bytes(&[5, 6]), Ok(()));
        let drained: std::vec::Vec<u8> = core::iter::from_fn(|| queue.pop()).collect();
        assert_eq!(drained, [1, 2, 3, 4, 5, 6]);
        assert!(queue.is_empty());
    }

    #[test]
    fn wraps_around_the_ring() {
        let queue: TxQueue<4> = TxQueue::new();

        for round in 0..10u8 {
            assert!(queue.push_slice(&[round, round + 1, round + 2]));
            assert_eq!(queue.pop(), Some(round));
            assert_eq!(queue.pop(), Some(round + 1));
            assert_eq!(queue.pop(), Some(round + 2));
            assert_eq!(queue.pop(), None);
        }
    }

    #[test]
    fn vec_sink_reports_full() {
        let mut buf: heapless::Vec<u8, 4> = heapless::Vec::new();
        assert_eq!(buf.write_bytes(&[1, 2, 3]), Ok(()));
        assert_eq!(buf.write_bytes(&[4, 5]), Err(nb::Error::WouldBlock));
        assert_eq!(buf.as_slice(), &[1, 2, 3]);
    }
}
