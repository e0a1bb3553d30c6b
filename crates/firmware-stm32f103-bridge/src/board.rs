// RS485 Bridge - USB/RS485 Serial Bridge Firmware
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Blue Pill bindings for the bridge's hardware traits.
//!
//! | Function          | Pin        |
//! |-------------------|------------|
//! | USB side TX / RX  | PA9 / PA10 (USART1) |
//! | RS485 TX / RX     | PA2 / PA3 (USART2)  |
//! | DE + /RE          | PA1        |
//! | LED (active low)  | PC13       |

use core::cell::RefCell;
use core::sync::atomic::{AtomicU32, Ordering};

use cortex_m::interrupt::Mutex;
use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::SYST;
use cortex_m_rt::exception;
use rs485_bridge_core::{
    Clock, ConfigError, DigitalLevel, DigitalOutput, EndpointId, Indicator, Parity, SerialConfig,
    SerialPort, StopBits, TransmitError, WordLength,
};
use stm32f1xx_hal::gpio::gpioa::PA1;
use stm32f1xx_hal::gpio::gpioc::PC13;
use stm32f1xx_hal::gpio::{Output, PushPull};
use stm32f1xx_hal::pac::{self, interrupt};
use stm32f1xx_hal::prelude::*;
use stm32f1xx_hal::rcc::Clocks;
use stm32f1xx_hal::serial::{self, Rx, Serial, Tx};

use crate::SLOTS;

static TICKS: AtomicU32 = AtomicU32::new(0);

/// Start the 1 kHz system tick that backs [`SysTickClock`].
pub fn start_systick(mut syst: SYST, clocks: &Clocks) {
    syst.set_clock_source(SystClkSource::Core);
    syst.set_reload(clocks.sysclk().raw() / 1000 - 1);
    syst.clear_current();
    syst.enable_counter();
    syst.enable_interrupt();
}

#[exception]
fn SysTick() {
    TICKS.fetch_add(1, Ordering::Relaxed);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SysTickClock;

impl Clock for SysTickClock {
    fn now_ms(&self) -> u32 {
        TICKS.load(Ordering::Relaxed)
    }

    fn delay_ms(&mut self, ms: u32) {
        if ms == 0 {
            return;
        }
        let start = self.now_ms();
        // The current tick is already partly over; wait one more.
        while self.now_ms().wrapping_sub(start) <= ms {
            cortex_m::asm::nop();
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Deadline {
    start_ms: u32,
    timeout_ms: u32,
}

impl Deadline {
    fn start(timeout_ms: u32) -> Self {
        Self {
            start_ms: SysTickClock.now_ms(),
            timeout_ms,
        }
    }

    /// Spin on a non-blocking operation until it completes or time runs out.
    fn retry<E>(&self, mut op: impl FnMut() -> nb::Result<(), E>) -> Result<(), TransmitError> {
        loop {
            match op() {
                Ok(()) => return Ok(()),
                Err(nb::Error::WouldBlock)
                    if SysTickClock.now_ms().wrapping_sub(self.start_ms) < self.timeout_ms => {}
                Err(_) => {
                    return Err(TransmitError::Timeout {
                        timeout_ms: self.timeout_ms,
                    })
                }
            }
        }
    }
}

/// Translate line settings into a USART configuration for a peripheral
/// clocked at `pclk_hz`.
///
/// The word length includes the parity bit, as on the USART itself.
fn line_config(config: &SerialConfig, pclk_hz: u32) -> Result<serial::Config, ConfigError> {
    config.usart_divider(pclk_hz)?;

    let line = serial::Config::default().baudrate(config.baud.bps());
    let line = match config.word_length {
        WordLength::Eight => line.wordlength_8bits(),
        WordLength::Nine => line.wordlength_9bits(),
    };
    let line = match config.parity {
        Parity::None => line.parity_none(),
        Parity::Even => line.parity_even(),
        Parity::Odd => line.parity_odd(),
    };
    Ok(line.stopbits(match config.stop_bits {
        StopBits::One => serial::StopBits::STOP1,
        StopBits::Two => serial::StopBits::STOP2,
    }))
}

/// One USART wired to one endpoint.
///
/// The RX half lives in a static so the interrupt handler can reach it;
/// each completed character is handed to [`SLOTS`] and reception is
/// switched off again until the loop re-arms it.
macro_rules! board_uart {
    ($name:ident, $USART:ident, $RX:ident, $endpoint:expr, $pclk:ident) => {
        static $RX: Mutex<RefCell<Option<Rx<pac::$USART>>>> = Mutex::new(RefCell::new(None));

        pub struct $name<PINS> {
            serial: Option<Serial<pac::$USART, PINS>>,
            tx: Option<Tx<pac::$USART>>,
            clocks: Clocks,
        }

        impl<PINS> $name<PINS> {
            pub fn new(serial: Serial<pac::$USART, PINS>, clocks: Clocks) -> Self {
                Self {
                    serial: Some(serial),
                    tx: None,
                    clocks,
                }
            }
        }

        impl<PINS> SerialPort for $name<PINS> {
            fn configure(&mut self, config: &SerialConfig) -> Result<(), ConfigError> {
                let pclk_hz = self.clocks.$pclk().raw();
                // Reject bad settings before the peripheral is taken apart.
                line_config(config, pclk_hz)?;
                let mut serial = self.serial.take().ok_or(ConfigError::PeripheralFault)?;
                // serial::Config is not Clone; build a fresh one per attempt.
                nb::block!(serial.reconfigure(line_config(config, pclk_hz)?, &self.clocks))
                    .map_err(|_| ConfigError::PeripheralFault)?;

                let (tx, rx) = serial.split();
                cortex_m::interrupt::free(|cs| $RX.borrow(cs).replace(Some(rx)));
                self.tx = Some(tx);
                Ok(())
            }

            fn arm_receive(&mut self) {
                cortex_m::interrupt::free(|cs| {
                    if let Some(rx) = $RX.borrow(cs).borrow_mut().as_mut() {
                        rx.listen();
                    }
                });
            }

            fn transmit_blocking(
                &mut self,
                bytes: &[u8],
                timeout_ms: u32,
            ) -> Result<(), TransmitError> {
                let tx = self
                    .tx
                    .as_mut()
                    .ok_or(TransmitError::Timeout { timeout_ms })?;
                let deadline = Deadline::start(timeout_ms);
                for &byte in bytes {
                    deadline.retry(|| tx.write(byte))?;
                }
                // Wait for TC so the stop bit is out before DE drops.
                deadline.retry(|| tx.flush())
            }
        }

        #[interrupt]
        fn $USART() {
            cortex_m::interrupt::free(|cs| {
                if let Some(rx) = $RX.borrow(cs).borrow_mut().as_mut() {
                    // A line error is cleared by the read; stay armed for the next byte.
                    if let Ok(byte) = rx.read() {
                        rx.unlisten();
                        SLOTS.on_receive_complete($endpoint, byte);
                    }
                }
            });
        }
    };
}

board_uart!(UsbUart, USART1, USB_RX, EndpointId::Usb, pclk2);
board_uart!(Rs485Uart, USART2, RS485_RX, EndpointId::Rs485, pclk1);

pub struct DirectionPin(PA1<Output<PushPull>>);

impl DirectionPin {
    pub fn new(pin: PA1<Output<PushPull>>) -> Self {
        Self(pin)
    }
}

impl DigitalOutput for DirectionPin {
    fn write(&mut self, level: DigitalLevel) {
        match level {
            DigitalLevel::High => self.0.set_high(),
            DigitalLevel::Low => self.0.set_low(),
        }
    }
}

/// PC13 LED, lit when the pin is low.
pub struct StatusLed(PC13<Output<PushPull>>);

impl StatusLed {
    pub fn new(pin: PC13<Output<PushPull>>) -> Self {
        Self(pin)
    }
}

impl Indicator for StatusLed {
    fn set(&mut self, on: bool) {
        if on {
            self.0.set_low();
        } else {
            self.0.set_high();
        }
    }

    fn toggle(&mut self) {
        self.0.toggle();
    }
}
