// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Timer peripherals behind `rtio`'s timer traits.
//!
//! - TIM6, TIM7 and TIM12 are the ticker timers. Their update interrupts call whatever handler is
//!   attached in the matching slot.
//! - TIM1, TIM3 and TIM4 can run in quadrature encoder mode (x4, both edges of TI1 and TI2) over the
//!   full 16-bit range.
//!
//! Everything is programmed at register level; the HAL only provides the clock tree and GPIO.

use core::cell::Cell;

use cortex_m::peripheral::NVIC;
use critical_section::Mutex;
use stm32f7xx_hal::pac::{self, interrupt};
use stm32f7xx_hal::rcc::Clocks;

use rtio::board::{TimerId, TIMERS};
use rtio::timer::{
    self, ChannelPin, Interrupt, PeriodicTimer, QuadratureCounter, TimerProvider,
};
use rtio::{Error, Result};

type Slot = Mutex<Cell<Option<&'static dyn Interrupt>>>;

static TIM6_HANDLER: Slot = Mutex::new(Cell::new(None));
static TIM7_HANDLER: Slot = Mutex::new(Cell::new(None));
static TIM12_HANDLER: Slot = Mutex::new(Cell::new(None));

/// Enable the bus clocks of every timer used here, including the TIM5 time base.
///
/// Must run before `RCC` is handed to the HAL.
pub fn enable_clocks(rcc: &pac::RCC) {
    rcc.apb1enr.modify(|_, w| {
        w.tim3en()
            .set_bit()
            .tim4en()
            .set_bit()
            .tim5en()
            .set_bit()
            .tim6en()
            .set_bit()
            .tim7en()
            .set_bit()
            .tim12en()
            .set_bit()
    });
    rcc.apb2enr.modify(|_, w| w.tim1en().set_bit());
}

pub enum PeriodicTim {
    Tim6(pac::TIM6),
    Tim7(pac::TIM7),
    Tim12(pac::TIM12),
}

pub enum QuadTim {
    Tim1(pac::TIM1),
    Tim3(pac::TIM3),
    Tim4(pac::TIM4),
}

// The register blocks differ per timer, so each operation is stamped out per variant.
macro_rules! each_periodic {
    ($this:expr, $t:ident => $body:expr) => {
        match $this {
            PeriodicTim::Tim6($t) => $body,
            PeriodicTim::Tim7($t) => $body,
            PeriodicTim::Tim12($t) => $body,
        }
    };
}

macro_rules! each_quad {
    ($this:expr, $t:ident => $body:expr) => {
        match $this {
            QuadTim::Tim1($t) => $body,
            QuadTim::Tim3($t) => $body,
            QuadTim::Tim4($t) => $body,
        }
    };
}

impl PeriodicTim {
    fn slot(&self) -> &'static Slot {
        match self {
            PeriodicTim::Tim6(_) => &TIM6_HANDLER,
            PeriodicTim::Tim7(_) => &TIM7_HANDLER,
            PeriodicTim::Tim12(_) => &TIM12_HANDLER,
        }
    }

    fn vector(&self) -> pac::Interrupt {
        match self {
            PeriodicTim::Tim6(_) => pac::Interrupt::TIM6_DAC,
            PeriodicTim::Tim7(_) => pac::Interrupt::TIM7,
            PeriodicTim::Tim12(_) => pac::Interrupt::TIM8_BRK_TIM12,
        }
    }

    fn configure(&self, psc: u16, arr: u16) {
        each_periodic!(self, tim => {
            // Disable counter while configuring
            tim.cr1.modify(|_, w| w.cen().clear_bit());
            tim.dier.modify(|_, w| w.uie().clear_bit());

            tim.psc.write(|w| unsafe { w.bits(u32::from(psc)) });
            tim.arr.write(|w| unsafe { w.bits(u32::from(arr)) });

            // Load PSC/ARR now; the forced update sets UIF, which is dropped
            tim.egr.write(|w| w.ug().set_bit());
            tim.sr.modify(|_, w| w.uif().clear_bit());
        })
    }
}

impl PeriodicTimer for PeriodicTim {
    fn id(&self) -> TimerId {
        match self {
            PeriodicTim::Tim6(_) => TimerId(6),
            PeriodicTim::Tim7(_) => TimerId(7),
            PeriodicTim::Tim12(_) => TimerId(12),
        }
    }

    fn attach(&mut self, handler: &'static dyn Interrupt) {
        let slot = self.slot();
        critical_section::with(|cs| slot.borrow(cs).set(Some(handler)));

        each_periodic!(&*self, tim => {
            tim.sr.modify(|_, w| w.uif().clear_bit());
            tim.dier.modify(|_, w| w.uie().set_bit());
            tim.cr1.modify(|_, w| w.cen().set_bit());
        });

        // SAFETY: the vector only reads the handler slot, which is interrupt-safe
        unsafe { NVIC::unmask(self.vector()) };
    }

    fn detach_all(&mut self) {
        NVIC::mask(self.vector());

        each_periodic!(&*self, tim => {
            tim.dier.modify(|_, w| w.uie().clear_bit());
            tim.cr1.modify(|_, w| w.cen().clear_bit());
        });

        let slot = self.slot();
        critical_section::with(|cs| slot.borrow(cs).set(None));
    }
}

impl QuadTim {
    /// Encoder mode 3 on CH1/CH2. `swap` inverts TI1 so that an A/B pair wired to CH2/CH1 still
    /// counts up in the A-leads-B direction.
    fn configure(&self, swap: bool) {
        each_quad!(self, tim => {
            // Disable counter while configuring
            tim.cr1.modify(|_, w| w.cen().clear_bit());

            // Auto-reload: max 16-bit
            tim.arr.write(|w| unsafe { w.bits(0xFFFF) });

            // Slave mode: encoder mode 3 (count on both TI1 and TI2)
            tim.smcr.modify(|_, w| unsafe { w.sms().bits(0b011) });

            // Configure CH1/CH2 as inputs from TI1/TI2
            tim.ccmr1_input().modify(|_, w| unsafe { w.cc1s().bits(0b01).cc2s().bits(0b01) });

            // Polarity and enable for both channels
            tim.ccer.modify(|_, w| {
                w.cc1p()
                    .bit(swap)
                    .cc2p()
                    .clear_bit()
                    .cc1e()
                    .set_bit()
                    .cc2e()
                    .set_bit()
            });

            tim.cnt.write(|w| unsafe { w.bits(0) });

            // Enable counter
            tim.cr1.modify(|_, w| w.cen().set_bit());
        })
    }
}

impl QuadratureCounter for QuadTim {
    #[inline]
    fn count(&self) -> u16 {
        each_quad!(self, tim => tim.cnt.read().bits() as u16)
    }

    #[inline]
    fn set_count(&mut self, count: u16) {
        each_quad!(&*self, tim => tim.cnt.write(|w| unsafe { w.bits(u32::from(count)) }))
    }
}

/// Owner of the timers that can be handed out.
///
/// TIM5 is not here; it is the [`Micros`](super::Micros) time base.
pub struct Timers {
    tim1: Option<pac::TIM1>,
    tim3: Option<pac::TIM3>,
    tim4: Option<pac::TIM4>,
    tim6: Option<pac::TIM6>,
    tim7: Option<pac::TIM7>,
    tim12: Option<pac::TIM12>,
    /// Kernel clock of the APB1 timers
    apb1_hz: u32,
}

impl Timers {
    pub fn new(
        tim1: pac::TIM1,
        tim3: pac::TIM3,
        tim4: pac::TIM4,
        tim6: pac::TIM6,
        tim7: pac::TIM7,
        tim12: pac::TIM12,
        clocks: &Clocks,
    ) -> Self {
        Self {
            tim1: Some(tim1),
            tim3: Some(tim3),
            tim4: Some(tim4),
            tim6: Some(tim6),
            tim7: Some(tim7),
            tim12: Some(tim12),
            apb1_hz: clocks.timclk1().raw(),
        }
    }
}

fn claim<T>(slot: &mut Option<T>, id: u8) -> Result<T> {
    slot.take().ok_or(Error::TimerBusy(id))
}

/// Timers that exist but are not offered for the requested use count as taken.
fn unavailable(id: u8) -> Error {
    if TIMERS.contains(&id) {
        Error::TimerBusy(id)
    } else {
        Error::UnknownTimer(id)
    }
}

impl TimerProvider for Timers {
    type Periodic = PeriodicTim;
    type Counter = QuadTim;

    fn periodic(&mut self, id: TimerId, freq_hz: f32) -> Result<PeriodicTim> {
        // TIM6, TIM7 and TIM12 all sit on APB1
        let (psc, arr) = timer::prescaler(self.apb1_hz, freq_hz)?;

        let tim = match id.0 {
            6 => PeriodicTim::Tim6(claim(&mut self.tim6, 6)?),
            7 => PeriodicTim::Tim7(claim(&mut self.tim7, 7)?),
            12 => PeriodicTim::Tim12(claim(&mut self.tim12, 12)?),
            n => return Err(unavailable(n)),
        };
        tim.configure(psc, arr);

        Ok(tim)
    }

    fn quadrature(&mut self, id: TimerId, a: ChannelPin, b: ChannelPin) -> Result<QuadTim> {
        let swap = match (a.channel, b.channel) {
            (1, 2) => false,
            (2, 1) => true,
            (1 | 2, _) => return Err(Error::NotEncoderChannel(b.pin)),
            _ => return Err(Error::NotEncoderChannel(a.pin)),
        };

        let tim = match id.0 {
            1 => QuadTim::Tim1(claim(&mut self.tim1, 1)?),
            3 => QuadTim::Tim3(claim(&mut self.tim3, 3)?),
            4 => QuadTim::Tim4(claim(&mut self.tim4, 4)?),
            n => return Err(unavailable(n)),
        };
        tim.configure(swap);

        Ok(tim)
    }
}

macro_rules! periodic_vector {
    ($vector:ident, $TIM:ident, $slot:ident) => {
        #[interrupt]
        fn $vector() {
            // SAFETY: only UIF is touched; the owning `PeriodicTim` never clears it concurrently
            let tim = unsafe { &*pac::$TIM::ptr() };
            tim.sr.modify(|_, w| w.uif().clear_bit());

            if let Some(handler) = critical_section::with(|cs| $slot.borrow(cs).get()) {
                handler.on_interrupt();
            }
        }
    };
}

periodic_vector!(TIM6_DAC, TIM6, TIM6_HANDLER);
periodic_vector!(TIM7, TIM7, TIM7_HANDLER);
periodic_vector!(TIM8_BRK_TIM12, TIM12, TIM12_HANDLER);
