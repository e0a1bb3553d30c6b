// RS485 Bridge - USB/RS485 Serial Bridge Firmware
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

/// Periodic liveness tick, advanced only from the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heartbeat {
    period_ms: u32,
    last_ms: u32,
}

impl Heartbeat {
    pub const fn new(period_ms: u32, now_ms: u32) -> Self {
        Self {
            period_ms,
            last_ms: now_ms,
        }
    }

    /// Returns `true` once per elapsed period and restarts the period at `now_ms`.
    ///
    /// Restarting from the observed time (not from the ideal deadline) means a
    /// late poll delays every later beat by the same amount.
    pub fn poll(&mut self, now_ms: u32) -> bool {
        if now_ms.wrapping_sub(self.last_ms) >= self.period_ms {
            self.last_ms = now_ms;
            true
        } else {
            false
        }
    }

    pub fn last_ms(&self) -> u32 {
        self.last_ms
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }
}
