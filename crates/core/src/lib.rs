// RS485 Bridge - USB/RS485 Serial Bridge Firmware
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Transparent byte relay between a USB-facing UART and an RS485-facing UART.
//!
//! The crate holds the bridging state machine only. Peripherals are reached
//! through the traits in [`hal`], so the same loop runs on the STM32F103
//! firmware and inside the host simulator.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

#[macro_use]
mod log;

pub mod bridge;
pub mod config;
pub mod direction;
pub mod endpoint;
pub mod error;
pub mod fatal;
pub mod hal;
pub mod heartbeat;
pub mod relay;
pub mod signals;
pub mod slot;

mod tests;

pub use bridge::{Bridge, BridgeParts, LoopReport, StartupFailure};
pub use config::{BridgeConfig, Parity, SerialConfig, StopBits, TransferMode, WordLength};
pub use direction::{Direction, DirectionController};
pub use endpoint::{EndpointId, SerialEndpoint};
pub use error::{ConfigError, InitError, TransmitError};
pub use fatal::FatalBlink;
pub use hal::{Clock, DigitalOutput, Indicator, SerialPort};
pub use heartbeat::Heartbeat;
pub use relay::{RelayChannel, RelayContext, RelayOutcome};
pub use signals::DigitalLevel;
pub use slot::{CompletionFlag, ReceiveSlot, ReceiveSlots};
