// RS485 Bridge - USB/RS485 Serial Bridge Firmware
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use core::fmt;

use crate::config::BridgeConfig;
use crate::direction::{Direction, DirectionController};
use crate::endpoint::{EndpointId, SerialEndpoint};
use crate::error::InitError;
use crate::fatal::FatalBlink;
use crate::hal::{Clock, DigitalOutput, Indicator, SerialPort};
use crate::heartbeat::Heartbeat;
use crate::relay::{RelayChannel, RelayContext, RelayOutcome};
use crate::slot::ReceiveSlots;

/// Peripherals handed to [`Bridge::start`].
pub struct BridgeParts<U, R, D, C, L> {
    pub usb: U,
    pub rs485: R,
    pub direction_pin: D,
    pub clock: C,
    pub indicator: L,
}

/// What one loop iteration did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopReport {
    pub usb_to_rs485: Option<RelayOutcome>,
    pub rs485_to_usb: Option<RelayOutcome>,
    pub heartbeat: bool,
}

impl LoopReport {
    pub fn outcome(&self, channel: RelayChannel) -> Option<RelayOutcome> {
        match channel.source {
            EndpointId::Usb => self.usb_to_rs485,
            EndpointId::Rs485 => self.rs485_to_usb,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.usb_to_rs485.is_none() && self.rs485_to_usb.is_none() && !self.heartbeat
    }
}

/// Boot failed. Holds what is needed to show the fatal blink.
pub struct StartupFailure<L, C> {
    error: InitError,
    blink: FatalBlink<L, C>,
}

impl<L: Indicator, C: Clock> StartupFailure<L, C> {
    pub fn error(&self) -> &InitError {
        &self.error
    }

    pub fn into_blink(self) -> FatalBlink<L, C> {
        self.blink
    }

    /// Blink forever. Neither endpoint is serviced again.
    pub fn halt(self) -> ! {
        self.blink.run()
    }
}

impl<L, C> fmt::Debug for StartupFailure<L, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StartupFailure")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

/// The bridging loop: two endpoints, one shared RS485 direction line, one LED.
pub struct Bridge<'a, U, R, D, C, L> {
    usb: SerialEndpoint<'a, U>,
    rs485: SerialEndpoint<'a, R>,
    direction: DirectionController<D, C>,
    clock: C,
    indicator: L,
    heartbeat: Heartbeat,
    config: BridgeConfig,
}

impl<'a, U, R, D, C, L> Bridge<'a, U, R, D, C, L>
where
    U: SerialPort,
    R: SerialPort,
    D: DigitalOutput,
    C: Clock + Clone,
    L: Indicator,
{
    /// Boot sequence: configure both UARTs, force RECEIVE, flash the
    /// indicator, arm both endpoints.
    ///
    /// A UART that rejects its configuration is fatal; the returned
    /// [`StartupFailure`] never gives the endpoints back.
    pub fn start(
        parts: BridgeParts<U, R, D, C, L>,
        slots: &'a ReceiveSlots,
        config: BridgeConfig,
    ) -> Result<Self, StartupFailure<L, C>> {
        let BridgeParts {
            usb,
            rs485,
            direction_pin,
            mut clock,
            mut indicator,
        } = parts;

        let mut usb = SerialEndpoint::new(EndpointId::Usb, usb, slots);
        let mut rs485 = SerialEndpoint::new(EndpointId::Rs485, rs485, slots);

        let configured = usb
            .configure(&config.serial)
            .and_then(|()| rs485.configure(&config.serial));
        if let Err(error) = configured {
            log_error!(%error, "peripheral init failed, halting");
            return Err(StartupFailure {
                error,
                blink: FatalBlink::new(indicator, clock, config.fatal_blink_ms),
            });
        }

        let mut direction =
            DirectionController::new(direction_pin, clock.clone(), config.direction_settle_ms);
        direction.set_direction(Direction::Receive);

        indicator.set(true);
        clock.delay_ms(config.startup_flash_ms);
        indicator.set(false);

        usb.arm_receive();
        rs485.arm_receive();

        let heartbeat = Heartbeat::new(config.heartbeat_period_ms, clock.now_ms());
        log_info!(baud = config.serial.baud, "bridge started");

        Ok(Self {
            usb,
            rs485,
            direction,
            clock,
            indicator,
            heartbeat,
            config,
        })
    }

    /// One loop iteration: USB->RS485, then RS485->USB, then heartbeat.
    pub fn poll(&mut self) -> LoopReport {
        let timeout_ms = self.config.transmit_timeout_ms;

        let usb_to_rs485 = self.usb.consume_and_relay(
            &mut self.rs485,
            RelayChannel::USB_TO_RS485.needs_direction_switch(),
            RelayContext {
                direction: &mut self.direction,
                indicator: &mut self.indicator,
                timeout_ms,
            },
        );

        let rs485_to_usb = self.rs485.consume_and_relay(
            &mut self.usb,
            RelayChannel::RS485_TO_USB.needs_direction_switch(),
            RelayContext {
                direction: &mut self.direction,
                indicator: &mut self.indicator,
                timeout_ms,
            },
        );

        let heartbeat = self.heartbeat.poll(self.clock.now_ms());
        if heartbeat {
            self.indicator.toggle();
        }

        LoopReport {
            usb_to_rs485,
            rs485_to_usb,
            heartbeat,
        }
    }

    /// Busy-poll forever.
    pub fn run(&mut self) -> ! {
        loop {
            self.poll();
        }
    }

    pub fn usb(&self) -> &SerialEndpoint<'a, U> {
        &self.usb
    }

    pub fn rs485(&self) -> &SerialEndpoint<'a, R> {
        &self.rs485
    }

    /// Re-request reception on one endpoint. Harmless while already armed.
    pub fn arm_receive(&mut self, id: EndpointId) {
        match id {
            EndpointId::Usb => self.usb.arm_receive(),
            EndpointId::Rs485 => self.rs485.arm_receive(),
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction.direction()
    }

    pub fn indicator(&self) -> &L {
        &self.indicator
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }
}
