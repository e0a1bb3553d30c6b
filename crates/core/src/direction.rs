// RS485 Bridge - USB/RS485 Serial Bridge Firmware
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::hal::{Clock, DigitalOutput};
use crate::signals::DigitalLevel;

/// State of the transceiver's DE/RE line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Direction {
    #[default]
    Receive,
    Transmit,
}

impl Direction {
    /// DE is active high, /RE active low; both are tied to one pin.
    pub const fn level(self) -> DigitalLevel {
        match self {
            Direction::Receive => DigitalLevel::Low,
            Direction::Transmit => DigitalLevel::High,
        }
    }
}

impl From<DigitalLevel> for Direction {
    fn from(level: DigitalLevel) -> Self {
        match level {
            DigitalLevel::Low => Direction::Receive,
            DigitalLevel::High => Direction::Transmit,
        }
    }
}

/// Owner of the RS485 direction line.
///
/// Every change is followed by a blocking settle delay, so the caller may use
/// the bus as soon as `set_direction` returns.
#[derive(Debug)]
pub struct DirectionController<P, C> {
    pin: P,
    clock: C,
    settle_ms: u32,
    state: Direction,
}

impl<P: DigitalOutput, C: Clock> DirectionController<P, C> {
    /// Wraps the pin without driving it; the bridge forces `Receive` at startup.
    pub fn new(pin: P, clock: C, settle_ms: u32) -> Self {
        Self {
            pin,
            clock,
            settle_ms,
            state: Direction::Receive,
        }
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.pin.write(direction.level());
        self.state = direction;
        self.clock.delay_ms(self.settle_ms);
    }

    pub fn direction(&self) -> Direction {
        self.state
    }
}
