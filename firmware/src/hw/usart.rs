// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! USART abstraction layer.
//!
//! Two very different ports:
//!
//! - [`Usart`] is a blocking debug console. [`UsartLogger`] puts one behind the `log` facade, so
//!   every `log` record ends up on the attached terminal, CRLF-terminated.
//! - [`TelemetryPort`] never blocks. Bytes go into [`TELEMETRY_TX`] and the USART3 TXE interrupt
//!   feeds them to the data register one at a time.
//!
//! To access the terminal on the host machine, connect to the debug USB port and use
//! ```text
//! $ screen /dev/tty.usbmodem* <baud_rate>
//! ```
//!
//! To close the debug terminal, press `Ctrl+A` then `Ctrl+\` then `y`.

use core::cell::RefCell;
use core::convert::Infallible;
use core::fmt::{self, Write as _};

use critical_section::Mutex;
use log::{LevelFilter, Log, Metadata, Record};
use nb::block;

use rtio::sink::{ByteSink, TxQueue};
use stm32f7xx_hal::{
    pac::{self, interrupt},
    prelude::*,
    serial::{Instance, Pins, Serial, Tx},
};

use crate::config::TX_CAPACITY;

/// Bytes waiting for the telemetry UART.
pub static TELEMETRY_TX: TxQueue<TX_CAPACITY> = TxQueue::new();

pub struct Usart<U: Instance> {
    tx: Tx<U>,
}

impl<U: Instance> Usart<U> {
    pub fn new<PINS: Pins<U>>(serial: Serial<U, PINS>) -> Self {
        let (tx, _rx) = serial.split();
        Self { tx }
    }

    #[inline]
    pub fn write_byte(&mut self, b: u8) {
        let _ = block!(self.tx.write(b));
    }

    pub fn write_str(&mut self, s: &str) {
        for &b in s.as_bytes() {
            self.write_byte(b);
        }
    }

    /// Write string and CRLF terminator.
    #[inline]
    pub fn println(&mut self, s: &str) {
        self.write_str(s);
        self.write_str("\r\n");
    }

    /// Block until the hardware TX FIFO/drain is flushed.
    #[inline]
    pub fn flush(&mut self) {
        let _ = block!(self.tx.flush());
    }
}

impl<U: Instance> fmt::Write for Usart<U> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        Usart::write_str(self, s);
        Ok(())
    }
}

/// `log` backend writing to a blocking [`Usart`].
///
/// Records are written with interrupts masked, so log from setup code and the main loop only,
/// never from an interrupt handler.
pub struct UsartLogger<U: Instance> {
    usart: Mutex<RefCell<Option<Usart<U>>>>,
    level: LevelFilter,
}

impl<U: Instance> UsartLogger<U> {
    pub const fn new(level: LevelFilter) -> Self {
        Self {
            usart: Mutex::new(RefCell::new(None)),
            level,
        }
    }

    /// Take over `usart` and register as the global logger.
    pub fn install(&'static self, mut usart: Usart<U>) -> Result<(), log::SetLoggerError>
    where
        Usart<U>: Send,
    {
        usart.println("");
        critical_section::with(|cs| self.usart.borrow_ref_mut(cs).replace(usart));
        log::set_logger(self)?;
        log::set_max_level(self.level);
        Ok(())
    }
}

impl<U: Instance> Log for UsartLogger<U>
where
    Usart<U>: Send,
{
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        critical_section::with(|cs| {
            if let Some(usart) = self.usart.borrow_ref_mut(cs).as_mut() {
                let _ = write!(usart, "[{:<5}] {}\r\n", record.level(), record.args());
            }
        });
    }

    fn flush(&self) {
        critical_section::with(|cs| {
            if let Some(usart) = self.usart.borrow_ref_mut(cs).as_mut() {
                usart.flush();
            }
        });
    }
}

fn usart3() -> &'static pac::usart1::RegisterBlock {
    // SAFETY: after `TelemetryPort::new`, only TXEIE and TDR are touched, from the port and from
    // the USART3 vector
    unsafe { &*pac::USART3::ptr() }
}

/// Interrupt-driven transmitter for the telemetry stream on USART3.
pub struct TelemetryPort {
    _tx: Tx<pac::USART3>,
}

impl TelemetryPort {
    pub fn new<PINS: Pins<pac::USART3>>(serial: Serial<pac::USART3, PINS>) -> Self {
        let (tx, _rx) = serial.split();
        TELEMETRY_TX.clear();

        // SAFETY: the vector only drains `TELEMETRY_TX`
        unsafe { cortex_m::peripheral::NVIC::unmask(pac::Interrupt::USART3) };

        Self { _tx: tx }
    }

    /// Bytes still waiting to be shifted out.
    #[inline]
    pub fn pending(&self) -> usize {
        TELEMETRY_TX.len()
    }
}

impl ByteSink for TelemetryPort {
    type Error = Infallible;

    fn write_bytes(&mut self, bytes: &[u8]) -> nb::Result<(), Infallible> {
        let mut queue = &TELEMETRY_TX;
        queue.write_bytes(bytes)?;

        // Wake the transmitter; the vector turns TXEIE off again once the queue runs dry
        usart3().cr1.modify(|_, w| w.txeie().set_bit());
        Ok(())
    }
}

#[interrupt]
fn USART3() {
    let usart = usart3();
    if usart.isr.read().txe().bit_is_clear() {
        return;
    }

    match TELEMETRY_TX.pop() {
        Some(byte) => usart.tdr.write(|w| unsafe { w.bits(u32::from(byte)) }),
        None => usart.cr1.modify(|_, w| w.txeie().clear_bit()),
    }
}
