// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Telemetry wire protocol: frame layout, the sending encoder and a receiving parser.

pub mod frame;
pub mod parser;
pub mod telemetry;

pub use frame::{encode_frame, Frame, IDENTIFIER};
pub use parser::Parser;
pub use telemetry::Telemetry;
