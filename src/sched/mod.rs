// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Deferred Timer Callbacks
//!
//! Interrupt handlers must stay short: no allocation, no blocking, no user logic. This module
//! splits periodic work into an interrupt half that only queues a request and a normal-context
//! half that runs it.
//!
//! ## Modules
//!
//! - [`defer`] - Bounded FIFO of deferred jobs, drained by the main loop.
//! - [`ticker`] - Binds a hardware timer to a periodic callback.
//! - [`reclaim`] - End-of-callback reclamation policy for the main-loop ticker.

pub mod defer;
pub mod reclaim;
pub mod ticker;

pub use defer::{DeferQueue, Job, Scheduler, Task};
pub use reclaim::Reclaimer;
pub use ticker::{Ticker, TickerOptions};
