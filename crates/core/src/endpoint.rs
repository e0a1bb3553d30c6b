// RS485 Bridge - USB/RS485 Serial Bridge Firmware
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use core::fmt;

use crate::config::SerialConfig;
use crate::error::{InitError, TransmitError};
use crate::hal::SerialPort;
use crate::slot::{ReceiveSlot, ReceiveSlots};

/// The two UARTs the bridge joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum EndpointId {
    /// Host side, behind the USB-serial converter. Point to point.
    Usb = 0,
    /// Half-duplex bus side, behind the DE/RE controlled transceiver.
    Rs485 = 1,
}

impl EndpointId {
    pub const COUNT: usize = 2;
    pub const ALL: [EndpointId; Self::COUNT] = [EndpointId::Usb, EndpointId::Rs485];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn peer(self) -> Self {
        match self {
            EndpointId::Usb => EndpointId::Rs485,
            EndpointId::Rs485 => EndpointId::Usb,
        }
    }

    /// Whether transmitting on this endpoint requires owning the shared bus.
    pub const fn is_shared_bus(self) -> bool {
        matches!(self, EndpointId::Rs485)
    }

    pub const fn name(self) -> &'static str {
        match self {
            EndpointId::Usb => "usb",
            EndpointId::Rs485 => "rs485",
        }
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A UART plus the receive slot its interrupt handler fills.
pub struct SerialEndpoint<'a, P> {
    id: EndpointId,
    port: P,
    slot: &'a ReceiveSlot,
    tx_slot: [u8; 1],
}

impl<'a, P: SerialPort> SerialEndpoint<'a, P> {
    pub fn new(id: EndpointId, port: P, slots: &'a ReceiveSlots) -> Self {
        Self {
            id,
            port,
            slot: slots.slot(id),
            tx_slot: [0],
        }
    }

    pub fn id(&self) -> EndpointId {
        self.id
    }

    pub fn configure(&mut self, config: &SerialConfig) -> Result<(), InitError> {
        self.port
            .configure(config)
            .map_err(|source| InitError::Configure {
                endpoint: self.id,
                source,
            })
    }

    /// Request the next byte. Idempotent while armed or while a byte is pending.
    pub fn arm_receive(&mut self) {
        if self.slot.arm() {
            self.port.arm_receive();
            log_trace!(endpoint = %self.id, "receive armed");
        }
    }

    pub fn is_armed(&self) -> bool {
        self.slot.is_armed()
    }

    /// A received byte is waiting for the loop.
    pub fn has_pending(&self) -> bool {
        self.slot.is_pending()
    }

    /// Blocking single-byte transmit through the endpoint's transmit slot.
    pub fn transmit(&mut self, byte: u8, timeout_ms: u32) -> Result<(), TransmitError> {
        self.tx_slot[0] = byte;
        self.port.transmit_blocking(&self.tx_slot, timeout_ms)
    }

    pub(crate) fn take_received(&mut self) -> Option<u8> {
        self.slot.take()
    }
}

impl<P: fmt::Debug> fmt::Debug for SerialEndpoint<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialEndpoint")
            .field("id", &self.id)
            .field("port", &self.port)
            .field("armed", &self.slot.is_armed())
            .field("pending", &self.slot.is_pending())
            .finish()
    }
}
