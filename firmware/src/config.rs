// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Board and loop settings for the Nucleo-F767ZI demo.

use log::LevelFilter;
use rtio::board::Pin;

pub const SYSCLK_MHZ: u32 = 216;

/// USART2 on the morpho header (PD5/PD6).
pub const DEBUG_BAUD: u32 = 115_200;
pub const LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// USART3 through the ST-LINK virtual COM port (PD8/PD9).
pub const TELEMETRY_BAUD: u32 = 921_600;
/// Position, velocity, loop period.
pub const CHANNELS: usize = 3;
pub const TX_CAPACITY: usize = 1024;

/// Logical ticker index, i.e. TIM6.
pub const LOOP_TIMER: u8 = 0;
pub const LOOP_HZ: u32 = 1000;

pub const DEFER_DEPTH: usize = 8;

/// TIM3 CH1/CH2. Must match the pins put into AF2 in `main`.
pub const ENCODER_A: Pin = Pin::new('B', 4);
pub const ENCODER_B: Pin = Pin::new('B', 5);
