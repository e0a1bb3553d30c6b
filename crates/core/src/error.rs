// RS485 Bridge - USB/RS485 Serial Bridge Firmware
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::endpoint::EndpointId;

/// Reasons a UART refuses its line settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("baud rate {0} cannot be generated from the peripheral clock")]
    UnsupportedBaud(u32),
    #[error("requested framing is not supported by this UART")]
    UnsupportedFraming,
    #[error("UART peripheral did not come out of reset")]
    PeripheralFault,
}

/// Boot-time failure. Always fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InitError {
    #[error("failed to configure the {endpoint} UART")]
    Configure {
        endpoint: EndpointId,
        #[source]
        source: ConfigError,
    },
}

impl InitError {
    pub fn endpoint(&self) -> EndpointId {
        match self {
            InitError::Configure { endpoint, .. } => *endpoint,
        }
    }
}

/// Data-path failure. The byte in flight is dropped and the bridge carries on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransmitError {
    #[error("transmit did not complete within {timeout_ms} ms")]
    Timeout { timeout_ms: u32 },
}
