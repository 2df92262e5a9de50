// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Demo control loop for the Nucleo-F767ZI.
//!
//! A 1 kHz ticker on TIM6 polls a quadrature encoder on TIM3 and streams position, velocity and
//! loop period over the ST-LINK virtual COM port. The green LED blinks at 1 Hz while the loop
//! runs; the red LED lights up whenever a telemetry frame had to be dropped.

#![no_main]
#![no_std]

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use cortex_m_rt::entry;
use critical_section::Mutex;
use log::{error, info, warn};
use panic_halt as _;

use hal::{
    pac,
    prelude::*,
    serial::{Config, Serial},
};
use stm32f7xx_hal as hal;

use rtio::encoder::Encoder;
use rtio::protocol::Telemetry;
use rtio::sched::{DeferQueue, Reclaimer, Ticker, TickerOptions};
use rtio::time::Stopwatch;
use rtio::ErrorKind;

mod config;
mod hw;
use hw::{Led, Micros, PeriodicTim, QuadTim, TelemetryPort, Timers, Usart, UsartLogger};

static DEFERRED: DeferQueue<{ config::DEFER_DEPTH }> = DeferQueue::new();
static LOGGER: UsartLogger<pac::USART2> = UsartLogger::new(config::LOG_LEVEL);

// All buffers are static, so there is nothing to give back; the pass only marks the end of
// each control cycle.
static RECLAIM: Reclaimer = Reclaimer::new(end_of_cycle);

static CONTROL: Mutex<RefCell<Option<Control>>> = Mutex::new(RefCell::new(None));
static TICKS: AtomicU32 = AtomicU32::new(0);
static FRAME_DROPPED: AtomicBool = AtomicBool::new(false);

struct Control {
    encoder: Encoder<QuadTim>,
    telemetry: Telemetry<TelemetryPort, Micros, { config::CHANNELS }>,
    period: Stopwatch<Micros>,
    last_position: i64,
}

impl Control {
    fn step(&mut self) -> rtio::Result<()> {
        let dt_us = self.period.lap();
        let position = self.encoder.poll();

        let velocity = if dt_us > 0 {
            (position - self.last_position) as f32 * 1.0e6 / dt_us as f32
        } else {
            f32::NAN
        };
        self.last_position = position;

        self.telemetry
            .set_all(&[position as f32, velocity, dt_us as f32])?;
        self.telemetry.send()
    }
}

fn control_step() {
    // Borrow the state out so the loop body runs with interrupts enabled
    let Some(mut control) = critical_section::with(|cs| CONTROL.borrow_ref_mut(cs).take()) else {
        return;
    };

    match control.step() {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::SinkWrite => {
            FRAME_DROPPED.store(true, Ordering::Relaxed);
        }
        Err(err) => error!("control step: {}", err),
    }

    critical_section::with(|cs| CONTROL.borrow_ref_mut(cs).replace(control));
}

fn end_of_cycle() {
    TICKS.fetch_add(1, Ordering::Relaxed);
}

fn halt(err: rtio::Error) -> ! {
    error!("setup failed: {}", err);
    loop {
        cortex_m::asm::wfi();
    }
}

#[entry]
fn main() -> ! {
    // Peripherals
    let dp = pac::Peripherals::take().unwrap();

    // Clocks
    hw::timers::enable_clocks(&dp.RCC);
    let rcc = dp.RCC.constrain();
    let clocks = rcc.cfgr.sysclk(config::SYSCLK_MHZ.MHz()).freeze();

    // GPIO
    let gpiob = dp.GPIOB.split();
    let gpiod = dp.GPIOD.split();

    // LED
    let mut led_green = Led::active_high(gpiob.pb0.into_push_pull_output());
    let mut led_red = Led::active_high(gpiob.pb14.into_push_pull_output());

    // USART2 (DBG)
    let tx = gpiod.pd5.into_alternate::<7>();
    let rx = gpiod.pd6.into_alternate::<7>();
    let usart_cfg = Config {
        baud_rate: config::DEBUG_BAUD.bps(),
        ..Default::default()
    };
    let serial = Serial::new(dp.USART2, (tx, rx), &clocks, usart_cfg);
    if LOGGER.install(Usart::new(serial)).is_err() {
        led_red.set(true);
    }
    info!("rtio demo, sysclk {} MHz", config::SYSCLK_MHZ);

    // USART3 (telemetry)
    let tx = gpiod.pd8.into_alternate::<7>();
    let rx = gpiod.pd9.into_alternate::<7>();
    let usart_cfg = Config {
        baud_rate: config::TELEMETRY_BAUD.bps(),
        ..Default::default()
    };
    let serial = Serial::new(dp.USART3, (tx, rx), &clocks, usart_cfg);
    let port = TelemetryPort::new(serial);

    // Encoder inputs, TIM3 CH1/CH2
    let _enc_a = gpiob.pb4.into_alternate::<2>();
    let _enc_b = gpiob.pb5.into_alternate::<2>();

    // Timers
    let micros = Micros::start(dp.TIM5, &clocks);
    let mut timers = Timers::new(
        dp.TIM1, dp.TIM3, dp.TIM4, dp.TIM6, dp.TIM7, dp.TIM12, &clocks,
    );

    let encoder = Encoder::new(&mut timers, config::ENCODER_A, config::ENCODER_B)
        .unwrap_or_else(halt);

    let control = Control {
        encoder,
        telemetry: Telemetry::new(port, micros),
        period: Stopwatch::new(micros),
        last_position: 0,
    };
    critical_section::with(|cs| {
        CONTROL.borrow_ref_mut(cs).replace(control);
    });

    let ticker = Ticker::new(
        &mut timers,
        config::LOOP_TIMER,
        config::LOOP_HZ as f32,
        control_step,
        &DEFERRED,
        TickerOptions::new().reclaim_at_end(&RECLAIM),
    )
    .unwrap_or_else(halt);
    let ticker: &'static Ticker<PeriodicTim> =
        cortex_m::singleton!(: Ticker<PeriodicTim> = ticker).unwrap();

    info!(
        "control loop on {} at {} Hz, {} channels",
        ticker.timer_id(),
        config::LOOP_HZ,
        config::CHANNELS
    );
    ticker.start();

    let mut seconds = 0;
    loop {
        DEFERRED.run_pending();

        // No-op while the loop ticker owns reclamation
        RECLAIM.background_pass();

        let elapsed = TICKS.load(Ordering::Relaxed) / config::LOOP_HZ;
        if elapsed != seconds {
            seconds = elapsed;
            led_green.toggle();
        }

        if FRAME_DROPPED.swap(false, Ordering::Relaxed) {
            if !led_red.is_on() {
                warn!("telemetry link saturated, dropping frames");
            }
            led_red.set(true);
        }

        cortex_m::asm::wfi();
    }
}
