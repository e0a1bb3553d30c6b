// RS485 Bridge - USB/RS485 Serial Bridge Firmware
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Peripheral collaborators the bridge drives.
//!
//! These are the only seams between the bridging logic and the hardware. The
//! firmware implements them on top of `stm32f1xx-hal`, the simulator on top of
//! a virtual clock.

use crate::config::SerialConfig;
use crate::error::{ConfigError, TransmitError};
use crate::signals::DigitalLevel;

/// One UART as seen from the main loop.
///
/// Reception is interrupt driven: `arm_receive` only requests the next byte.
/// The interrupt handler hands that byte to
/// [`ReceiveSlots::on_receive_complete`](crate::slot::ReceiveSlots::on_receive_complete).
pub trait SerialPort {
    /// Apply line settings. Called once per port at boot.
    fn configure(&mut self, config: &SerialConfig) -> Result<(), ConfigError>;

    /// Enable one-shot delivery of a single received byte.
    ///
    /// Must be cheap and must not block; calling it while already armed has
    /// no effect.
    fn arm_receive(&mut self);

    /// Shift `bytes` out, returning once the last stop bit has left the pin
    /// or `timeout_ms` has elapsed.
    fn transmit_blocking(&mut self, bytes: &[u8], timeout_ms: u32) -> Result<(), TransmitError>;
}

/// A push-pull GPIO output.
pub trait DigitalOutput {
    fn write(&mut self, level: DigitalLevel);
}

/// Status LED.
pub trait Indicator {
    fn set(&mut self, on: bool);
    fn toggle(&mut self);
}

/// Monotonic millisecond tick source with a busy-wait delay.
pub trait Clock {
    /// Milliseconds since boot. Wraps after ~49 days; callers use `wrapping_sub`.
    fn now_ms(&self) -> u32;

    /// Block for at least `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);
}
