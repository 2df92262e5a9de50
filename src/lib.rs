// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # rtio
//!
//! Real-time I/O building blocks for a bare-metal control loop on an STM32F767 (Nucleo-F767ZI):
//! periodic timer callbacks that run outside interrupt context, quadrature encoder position
//! tracking, and a compact float telemetry stream for a serial port.
//!
//! The crate is `no_std` and hardware-agnostic. Peripheral access sits behind the traits in
//! [`timer`], [`sink`] and [`time`]; the `firmware/` crate implements them for the board.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | -------- |
//! | [`sched`] | Deferred callback queue, periodic tickers, reclamation hook |
//! | [`encoder`] | 16-bit counter unwrapping into an unbounded position |
//! | [`protocol`] | Telemetry frame encoder and stream parser |
//! | [`board`] | Pin-to-timer wiring table and ticker timer assignment |
//! | [`timer`], [`sink`], [`time`] | Hardware-facing traits |
//!
//! ## Getting Started
//!
//! Run the host tests:
//!
//! ```bash
//! cargo test
//! ```
//!
//! Flash the board:
//!
//! ```bash
//! cd firmware && cargo run --release
//! ```
//!
//! ## License
//!
//! Licensed under the **MIT License**.
//! See the `LICENSE` file in the repository root for full terms.
//!
//! © 2025–2026 Christopher Liu

#![cfg_attr(not(test), no_std)]

pub mod board;
pub mod encoder;
pub mod error;
pub mod protocol;
pub mod sched;
pub mod sink;
pub mod time;
pub mod timer;

pub use error::{Error, ErrorKind, Result};
