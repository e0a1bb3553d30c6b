// RS485 Bridge - USB/RS485 Serial Bridge Firmware
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::error::ConfigError;

/// UART word length. On STM32 the parity bit, when enabled, is the MSB of the word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum WordLength {
    #[default]
    Eight,
    Nine,
}

impl WordLength {
    pub const fn bits(self) -> u32 {
        match self {
            WordLength::Eight => 8,
            WordLength::Nine => 9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StopBits {
    #[default]
    One,
    Two,
}

impl StopBits {
    pub const fn bits(self) -> u32 {
        match self {
            StopBits::One => 1,
            StopBits::Two => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Parity {
    #[default]
    None,
    Even,
    Odd,
}

/// Which halves of the UART are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TransferMode {
    Rx,
    Tx,
    #[default]
    TxRx,
}

/// Line settings applied to both UARTs at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SerialConfig {
    pub baud: u32,
    pub word_length: WordLength,
    pub stop_bits: StopBits,
    pub parity: Parity,
    pub mode: TransferMode,
}

impl SerialConfig {
    /// 8 data bits, no parity, one stop bit, both directions enabled.
    pub const fn new_8n1(baud: u32) -> Self {
        Self {
            baud,
            word_length: WordLength::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
            mode: TransferMode::TxRx,
        }
    }

    /// Bit periods one character occupies on the wire: start + word + stop.
    pub const fn frame_bits(&self) -> u32 {
        1 + self.word_length.bits() + self.stop_bits.bits()
    }

    /// Time to shift one character out, rounded up to the next microsecond.
    ///
    /// Returns `None` for a zero baud rate.
    pub const fn byte_time_us(&self) -> Option<u32> {
        if self.baud == 0 {
            return None;
        }
        let total = self.frame_bits() as u64 * 1_000_000;
        Some(total.div_ceil(self.baud as u64) as u32)
    }

    /// Check the line against a USART clocked at `pclk_hz` and return the
    /// baud divider (16x oversampling, rounded to nearest).
    ///
    /// Fails for a zero baud, a divider outside `16..=0xFFFF`, or any mode
    /// other than TX+RX.
    pub const fn usart_divider(&self, pclk_hz: u32) -> Result<u32, ConfigError> {
        if !matches!(self.mode, TransferMode::TxRx) {
            return Err(ConfigError::UnsupportedFraming);
        }
        if self.baud == 0 {
            return Err(ConfigError::UnsupportedBaud(self.baud));
        }
        let div = (pclk_hz as u64 + self.baud as u64 / 2) / self.baud as u64;
        if div < 16 || div > 0xFFFF {
            return Err(ConfigError::UnsupportedBaud(self.baud));
        }
        Ok(div as u32)
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::new_8n1(BridgeConfig::REFERENCE_BAUD)
    }
}

/// Build-time tunables for the bridge. All durations are milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BridgeConfig {
    pub serial: SerialConfig,
    /// Upper bound on one blocking transmit before the byte is dropped.
    pub transmit_timeout_ms: u32,
    pub heartbeat_period_ms: u32,
    /// Wait after every DE/RE change before the bus is used.
    pub direction_settle_ms: u32,
    /// Indicator on-time at boot, before reception is armed.
    pub startup_flash_ms: u32,
    /// Half period of the blink shown after a fatal init error.
    pub fatal_blink_ms: u32,
}

impl BridgeConfig {
    pub const REFERENCE_BAUD: u32 = 115_200;

    /// Settings of the shipped board: 115200 8N1, 1 s timeout, 1 s heartbeat.
    pub const REFERENCE: Self = Self {
        serial: SerialConfig::new_8n1(Self::REFERENCE_BAUD),
        transmit_timeout_ms: 1000,
        heartbeat_period_ms: 1000,
        direction_settle_ms: 1,
        startup_flash_ms: 500,
        fatal_blink_ms: 100,
    };
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::REFERENCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_config() {
        let config = BridgeConfig::default();
        assert_eq!(config, BridgeConfig::REFERENCE);
        assert_eq!(config.serial.baud, 115_200);
        assert_eq!(config.serial.word_length, WordLength::Eight);
        assert_eq!(config.serial.stop_bits, StopBits::One);
        assert_eq!(config.serial.parity, Parity::None);
        assert_eq!(config.serial.mode, TransferMode::TxRx);
        assert_eq!(config.transmit_timeout_ms, 1000);
        assert_eq!(config.heartbeat_period_ms, 1000);
        assert_eq!(config.direction_settle_ms, 1);
    }

    #[test]
    fn test_frame_timing() {
        let serial = SerialConfig::new_8n1(115_200);
        assert_eq!(serial.frame_bits(), 10);
        // 10 bits at 115200 baud is 86.8 us.
        assert_eq!(serial.byte_time_us(), Some(87));

        let slow = SerialConfig {
            stop_bits: StopBits::Two,
            word_length: WordLength::Nine,
            ..SerialConfig::new_8n1(9600)
        };
        assert_eq!(slow.frame_bits(), 12);
        assert_eq!(slow.byte_time_us(), Some(1250));

        assert_eq!(SerialConfig::new_8n1(0).byte_time_us(), None);
    }

    #[test]
    fn test_usart_divider() {
        let line = SerialConfig::new_8n1(115_200);
        // 72 MHz / 115200 = 625 exactly; 36 MHz gives 312.5, rounded up.
        assert_eq!(line.usart_divider(72_000_000), Ok(625));
        assert_eq!(line.usart_divider(36_000_000), Ok(313));

        assert_eq!(
            SerialConfig::new_8n1(4_500_000).usart_divider(36_000_000),
            Err(ConfigError::UnsupportedBaud(4_500_000))
        );
        assert_eq!(
            SerialConfig::new_8n1(300).usart_divider(72_000_000),
            Err(ConfigError::UnsupportedBaud(300))
        );
        assert_eq!(
            SerialConfig::new_8n1(0).usart_divider(36_000_000),
            Err(ConfigError::UnsupportedBaud(0))
        );

        let tx_only = SerialConfig {
            mode: TransferMode::Tx,
            ..line
        };
        assert_eq!(
            tx_only.usart_divider(36_000_000),
            Err(ConfigError::UnsupportedFraming)
        );
    }
}
