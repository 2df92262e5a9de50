// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

pub mod clock;
pub mod led;
pub mod timers;
pub mod usart;

pub use clock::Micros;
pub use led::Led;
pub use timers::{PeriodicTim, QuadTim, Timers};
pub use usart::{TelemetryPort, Usart, UsartLogger};
