// RS485 Bridge - USB/RS485 Serial Bridge Firmware
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::hal::{Clock, Indicator};

/// Terminal state after an unrecoverable init error: uniform fast blink,
/// nothing else runs until power cycle.
#[derive(Debug)]
pub struct FatalBlink<L, C> {
    indicator: L,
    clock: C,
    half_period_ms: u32,
}

impl<L: Indicator, C: Clock> FatalBlink<L, C> {
    pub fn new(indicator: L, clock: C, half_period_ms: u32) -> Self {
        Self {
            indicator,
            clock,
            half_period_ms,
        }
    }

    /// One toggle followed by one half period.
    pub fn blink_once(&mut self) {
        self.indicator.toggle();
        self.clock.delay_ms(self.half_period_ms);
    }

    pub fn run(mut self) -> ! {
        loop {
            self.blink_once();
        }
    }

    pub fn indicator(&self) -> &L {
        &self.indicator
    }
}
