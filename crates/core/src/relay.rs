// RS485 Bridge - USB/RS485 Serial Bridge Firmware
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::direction::{Direction, DirectionController};
use crate::endpoint::{EndpointId, SerialEndpoint};
use crate::error::TransmitError;
use crate::hal::{Clock, DigitalOutput, Indicator, SerialPort};

/// One direction of traffic through the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayChannel {
    pub source: EndpointId,
    pub target: EndpointId,
}

impl RelayChannel {
    pub const USB_TO_RS485: Self = Self {
        source: EndpointId::Usb,
        target: EndpointId::Rs485,
    };

    pub const RS485_TO_USB: Self = Self {
        source: EndpointId::Rs485,
        target: EndpointId::Usb,
    };

    /// Fixed per-iteration service order. Under simultaneous traffic the USB
    /// side always wins the tie.
    pub const SERVICE_ORDER: [Self; 2] = [Self::USB_TO_RS485, Self::RS485_TO_USB];

    pub const fn needs_direction_switch(self) -> bool {
        self.target.is_shared_bus()
    }
}

/// What happened to one consumed byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    Forwarded { byte: u8 },
    /// Transmit failed; the byte is gone and will not be retried.
    Dropped { byte: u8, error: TransmitError },
}

impl RelayOutcome {
    pub fn byte(&self) -> u8 {
        match *self {
            RelayOutcome::Forwarded { byte } | RelayOutcome::Dropped { byte, .. } => byte,
        }
    }

    pub fn is_forwarded(&self) -> bool {
        matches!(self, RelayOutcome::Forwarded { .. })
    }
}

/// Shared resources a relay borrows from the loop for one byte.
pub struct RelayContext<'r, D, C, L> {
    pub direction: &'r mut DirectionController<D, C>,
    pub indicator: &'r mut L,
    pub timeout_ms: u32,
}

impl<S: SerialPort> SerialEndpoint<'_, S> {
    /// Forward this endpoint's pending byte to `target`, if there is one.
    ///
    /// Sequence: clear flag, [TRANSMIT + settle], blocking transmit,
    /// [RECEIVE + settle], re-arm own receive, toggle indicator on success.
    /// The direction line is back in RECEIVE and the source is re-armed on
    /// every path, including a timed-out transmit.
    pub fn consume_and_relay<T, D, C, L>(
        &mut self,
        target: &mut SerialEndpoint<'_, T>,
        needs_direction_switch: bool,
        ctx: RelayContext<'_, D, C, L>,
    ) -> Option<RelayOutcome>
    where
        T: SerialPort,
        D: DigitalOutput,
        C: Clock,
        L: Indicator,
    {
        let byte = self.take_received()?;

        if needs_direction_switch {
            ctx.direction.set_direction(Direction::Transmit);
        }
        let result = target.transmit(byte, ctx.timeout_ms);
        if needs_direction_switch {
            ctx.direction.set_direction(Direction::Receive);
        }

        self.arm_receive();

        match result {
            Ok(()) => {
                ctx.indicator.toggle();
                log_trace!(from = %self.id(), to = %target.id(), byte, "byte relayed");
                Some(RelayOutcome::Forwarded { byte })
            }
            Err(error) => {
                log_debug!(from = %self.id(), to = %target.id(), byte, %error, "byte dropped");
                Some(RelayOutcome::Dropped { byte, error })
            }
        }
    }
}
