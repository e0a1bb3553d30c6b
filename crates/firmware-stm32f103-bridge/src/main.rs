#![no_std]
// RS485 Bridge - USB/RS485 Serial Bridge Firmware
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

#![no_main]

mod board;

use panic_halt as _;
use cortex_m::peripheral::NVIC;
use cortex_m_rt::entry;
use rs485_bridge_core::{Bridge, BridgeConfig, BridgeParts, ReceiveSlots};
use stm32f1xx_hal::serial::{Config, Serial};
use stm32f1xx_hal::{pac, prelude::*};

use crate::board::{DirectionPin, Rs485Uart, StatusLed, SysTickClock, UsbUart};

/// Receive slots shared with the USART interrupt handlers.
pub static SLOTS: ReceiveSlots = ReceiveSlots::new();

#[entry]
fn main() -> ! {
    let dp = pac::Peripherals::take().unwrap();
    let cp = cortex_m::Peripherals::take().unwrap();
    let config = BridgeConfig::REFERENCE;

    let mut flash = dp.FLASH.constrain();
    let rcc = dp.RCC.constrain();
    let mut afio = dp.AFIO.constrain();

    // 8 MHz HSE, 72 MHz core, APB1 at its 36 MHz limit.
    let clocks = rcc
        .cfgr
        .use_hse(8.MHz())
        .sysclk(72.MHz())
        .pclk1(36.MHz())
        .freeze(&mut flash.acr);
    board::start_systick(cp.SYST, &clocks);

    let mut gpioa = dp.GPIOA.split();
    let mut gpioc = dp.GPIOC.split();

    let usb_pins = (
        gpioa.pa9.into_alternate_push_pull(&mut gpioa.crh),
        gpioa.pa10,
    );
    let rs485_pins = (
        gpioa.pa2.into_alternate_push_pull(&mut gpioa.crl),
        gpioa.pa3,
    );
    // Line settings are applied by the bridge during startup.
    let usb = Serial::new(dp.USART1, usb_pins, &mut afio.mapr, Config::default(), &clocks);
    let rs485 = Serial::new(dp.USART2, rs485_pins, &mut afio.mapr, Config::default(), &clocks);

    let direction_pin = gpioa.pa1.into_push_pull_output(&mut gpioa.crl);
    let led = gpioc.pc13.into_push_pull_output(&mut gpioc.crh);

    // RXNE interrupts stay disabled until an endpoint is armed.
    unsafe {
        NVIC::unmask(pac::Interrupt::USART1);
        NVIC::unmask(pac::Interrupt::USART2);
    }

    let parts = BridgeParts {
        usb: UsbUart::new(usb, clocks),
        rs485: Rs485Uart::new(rs485, clocks),
        direction_pin: DirectionPin::new(direction_pin),
        clock: SysTickClock,
        indicator: StatusLed::new(led),
    };

    match Bridge::start(parts, &SLOTS, config) {
        Ok(mut bridge) => bridge.run(),
        Err(failure) => failure.halt(),
    }
}
