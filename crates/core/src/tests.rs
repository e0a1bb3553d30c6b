// RS485 Bridge - USB/RS485 Serial Bridge Firmware
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

#[cfg(test)]
mod integration_tests {
    use crate::direction::Direction;
    use crate::error::{ConfigError, InitError, TransmitError};
    use crate::hal::{Clock, DigitalOutput, Indicator, SerialPort};
    use crate::relay::RelayOutcome;
    use crate::signals::DigitalLevel;
    use crate::slot::ReceiveSlots;
    use crate::{Bridge, BridgeConfig, BridgeParts, EndpointId, SerialConfig};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        Configure(EndpointId),
        Arm(EndpointId),
        Transmit(EndpointId, u8),
        TransmitTimeout(EndpointId, u8),
        Pin(DigitalLevel),
        Delay(u32),
        Led(bool),
        Toggle,
    }

    /// Shared event log and virtual millisecond clock.
    #[derive(Debug, Clone, Default)]
    struct Recorder {
        events: Rc<RefCell<Vec<Event>>>,
        now: Rc<Cell<u32>>,
    }

    impl Recorder {
        fn push(&self, event: Event) {
            self.events.borrow_mut().push(event);
        }

        fn take(&self) -> Vec<Event> {
            std::mem::take(&mut *self.events.borrow_mut())
        }

        fn advance(&self, ms: u32) {
            self.now.set(self.now.get().wrapping_add(ms));
        }
    }

    #[derive(Debug)]
    struct RecordingPort {
        id: EndpointId,
        rec: Recorder,
        reject_config: Option<ConfigError>,
        stall: bool,
    }

    impl SerialPort for RecordingPort {
        fn configure(&mut self, _config: &SerialConfig) -> Result<(), ConfigError> {
            self.rec.push(Event::Configure(self.id));
            match self.reject_config {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }

        fn arm_receive(&mut self) {
            self.rec.push(Event::Arm(self.id));
        }

        fn transmit_blocking(&mut self, bytes: &[u8], timeout_ms: u32) -> Result<(), TransmitError> {
            if self.stall {
                self.rec.push(Event::TransmitTimeout(self.id, bytes[0]));
                self.rec.advance(timeout_ms);
                return Err(TransmitError::Timeout { timeout_ms });
            }
            for &b in bytes {
                self.rec.push(Event::Transmit(self.id, b));
            }
            Ok(())
        }
    }

    #[derive(Debug)]
    struct RecordingPin(Recorder);

    impl DigitalOutput for RecordingPin {
        fn write(&mut self, level: DigitalLevel) {
            self.0.push(Event::Pin(level));
        }
    }

    #[derive(Debug)]
    struct RecordingLed {
        rec: Recorder,
        toggles: u32,
    }

    impl Indicator for RecordingLed {
        fn set(&mut self, on: bool) {
            self.rec.push(Event::Led(on));
        }

        fn toggle(&mut self) {
            self.toggles += 1;
            self.rec.push(Event::Toggle);
        }
    }

    #[derive(Debug, Clone)]
    struct RecordingClock(Recorder);

    impl Clock for RecordingClock {
        fn now_ms(&self) -> u32 {
            self.0.now.get()
        }

        fn delay_ms(&mut self, ms: u32) {
            self.0.push(Event::Delay(ms));
            self.0.advance(ms);
        }
    }

    type TestBridge<'a> =
        Bridge<'a, RecordingPort, RecordingPort, RecordingPin, RecordingClock, RecordingLed>;

    fn parts(
        rec: &Recorder,
    ) -> BridgeParts<RecordingPort, RecordingPort, RecordingPin, RecordingClock, RecordingLed> {
        BridgeParts {
            usb: RecordingPort {
                id: EndpointId::Usb,
                rec: rec.clone(),
                reject_config: None,
                stall: false,
            },
            rs485: RecordingPort {
                id: EndpointId::Rs485,
                rec: rec.clone(),
                reject_config: None,
                stall: false,
            },
            direction_pin: RecordingPin(rec.clone()),
            clock: RecordingClock(rec.clone()),
            indicator: RecordingLed {
                rec: rec.clone(),
                toggles: 0,
            },
        }
    }

    fn started<'a>(rec: &Recorder, slots: &'a ReceiveSlots) -> TestBridge<'a> {
        let bridge = Bridge::start(parts(rec), slots, BridgeConfig::REFERENCE).unwrap();
        rec.take();
        bridge
    }

    #[test]
    fn test_startup_sequence() {
        let rec = Recorder::default();
        let slots = ReceiveSlots::new();
        let bridge = Bridge::start(parts(&rec), &slots, BridgeConfig::REFERENCE).unwrap();

        assert_eq!(
            rec.take(),
            vec![
                Event::Configure(EndpointId::Usb),
                Event::Configure(EndpointId::Rs485),
                Event::Pin(DigitalLevel::Low),
                Event::Delay(1),
                Event::Led(true),
                Event::Delay(500),
                Event::Led(false),
                Event::Arm(EndpointId::Usb),
                Event::Arm(EndpointId::Rs485),
            ]
        );
        assert_eq!(bridge.direction(), Direction::Receive);
        assert!(bridge.usb().is_armed());
        assert!(bridge.rs485().is_armed());
        assert_eq!(*bridge.config(), BridgeConfig::REFERENCE);
    }

    #[test]
    fn test_usb_byte_relayed_with_direction_switch() {
        let rec = Recorder::default();
        let slots = ReceiveSlots::new();
        let mut bridge = started(&rec, &slots);

        assert!(slots.on_receive_complete(EndpointId::Usb, 0x41));
        let report = bridge.poll();

        assert_eq!(report.usb_to_rs485, Some(RelayOutcome::Forwarded { byte: 0x41 }));
        assert_eq!(report.rs485_to_usb, None);
        assert_eq!(
            rec.take(),
            vec![
                Event::Pin(DigitalLevel::High),
                Event::Delay(1),
                Event::Transmit(EndpointId::Rs485, 0x41),
                Event::Pin(DigitalLevel::Low),
                Event::Delay(1),
                Event::Arm(EndpointId::Usb),
                Event::Toggle,
            ]
        );
        assert_eq!(bridge.direction(), Direction::Receive);
        assert!(bridge.usb().is_armed());
    }

    #[test]
    fn test_rs485_byte_relayed_without_direction_switch() {
        let rec = Recorder::default();
        let slots = ReceiveSlots::new();
        let mut bridge = started(&rec, &slots);

        assert!(slots.on_receive_complete(EndpointId::Rs485, 0x7E));
        let report = bridge.poll();

        assert_eq!(report.rs485_to_usb, Some(RelayOutcome::Forwarded { byte: 0x7E }));
        assert_eq!(
            rec.take(),
            vec![
                Event::Transmit(EndpointId::Usb, 0x7E),
                Event::Arm(EndpointId::Rs485),
                Event::Toggle,
            ]
        );
    }

    #[test]
    fn test_simultaneous_traffic_usb_first_same_iteration() {
        let rec = Recorder::default();
        let slots = ReceiveSlots::new();
        let mut bridge = started(&rec, &slots);

        // RS485 interrupt fires first; the loop order still wins.
        assert!(slots.on_receive_complete(EndpointId::Rs485, 0x02));
        assert!(slots.on_receive_complete(EndpointId::Usb, 0x01));
        let report = bridge.poll();

        assert_eq!(report.usb_to_rs485, Some(RelayOutcome::Forwarded { byte: 0x01 }));
        assert_eq!(report.rs485_to_usb, Some(RelayOutcome::Forwarded { byte: 0x02 }));

        let transmits: Vec<Event> = rec
            .take()
            .into_iter()
            .filter(|e| matches!(e, Event::Transmit(..)))
            .collect();
        assert_eq!(
            transmits,
            vec![
                Event::Transmit(EndpointId::Rs485, 0x01),
                Event::Transmit(EndpointId::Usb, 0x02),
            ]
        );
        assert!(!bridge.usb().has_pending());
        assert!(!bridge.rs485().has_pending());
    }

    #[test]
    fn test_timeout_drops_byte_and_rearms() {
        let rec = Recorder::default();
        let slots = ReceiveSlots::new();
        let mut p = parts(&rec);
        p.rs485.stall = true;
        // Keep the heartbeat out of the way of the one-second stall.
        let config = BridgeConfig {
            heartbeat_period_ms: 60_000,
            ..BridgeConfig::REFERENCE
        };
        let mut bridge = Bridge::start(p, &slots, config).unwrap();
        rec.take();

        assert!(slots.on_receive_complete(EndpointId::Usb, 0x99));
        let report = bridge.poll();

        assert_eq!(
            report.usb_to_rs485,
            Some(RelayOutcome::Dropped {
                byte: 0x99,
                error: TransmitError::Timeout { timeout_ms: 1000 },
            })
        );
        let events = rec.take();
        assert_eq!(
            events,
            vec![
                Event::Pin(DigitalLevel::High),
                Event::Delay(1),
                Event::TransmitTimeout(EndpointId::Rs485, 0x99),
                Event::Pin(DigitalLevel::Low),
                Event::Delay(1),
                Event::Arm(EndpointId::Usb),
            ]
        );
        assert!(!events.contains(&Event::Toggle));
        assert_eq!(bridge.direction(), Direction::Receive);

        // The bridge keeps going after the drop.
        assert!(slots.on_receive_complete(EndpointId::Usb, 0x9A));
        assert_eq!(bridge.poll().usb_to_rs485.map(|o| o.byte()), Some(0x9A));
    }

    #[test]
    fn test_arm_receive_is_idempotent() {
        let rec = Recorder::default();
        let slots = ReceiveSlots::new();
        let mut bridge = started(&rec, &slots);

        bridge.arm_receive(EndpointId::Usb);
        assert!(rec.take().is_empty());

        assert!(slots.on_receive_complete(EndpointId::Usb, 0x33));
        bridge.arm_receive(EndpointId::Usb);
        bridge.arm_receive(EndpointId::Usb);
        assert!(rec.take().is_empty());
        assert!(bridge.usb().has_pending());

        let first = bridge.poll();
        assert_eq!(first.usb_to_rs485, Some(RelayOutcome::Forwarded { byte: 0x33 }));
        let second = bridge.poll();
        assert_eq!(second.usb_to_rs485, None);
    }

    #[test]
    fn test_overrun_byte_is_lost() {
        let rec = Recorder::default();
        let slots = ReceiveSlots::new();
        let mut bridge = started(&rec, &slots);

        assert!(slots.on_receive_complete(EndpointId::Usb, b'a'));
        assert!(!slots.on_receive_complete(EndpointId::Usb, b'b'));

        assert_eq!(bridge.poll().usb_to_rs485.map(|o| o.byte()), Some(b'a'));
        assert_eq!(bridge.poll().usb_to_rs485, None);
    }

    #[test]
    fn test_idle_heartbeat_once_per_period() {
        let rec = Recorder::default();
        let slots = ReceiveSlots::new();
        let mut bridge = started(&rec, &slots);

        let mut beats = Vec::new();
        for ms in 1..=3000u32 {
            rec.advance(1);
            if bridge.poll().heartbeat {
                beats.push(ms);
            }
        }
        assert_eq!(beats, vec![1000, 2000, 3000]);
        assert_eq!(bridge.indicator().toggles, 3);
    }

    #[test]
    fn test_busy_poll_without_traffic_is_idle() {
        let rec = Recorder::default();
        let slots = ReceiveSlots::new();
        let mut bridge = started(&rec, &slots);

        for _ in 0..100 {
            assert!(bridge.poll().is_idle());
        }
        assert!(rec.take().is_empty());
    }

    #[test]
    fn test_init_failure_enters_fatal_blink() {
        let rec = Recorder::default();
        let slots = ReceiveSlots::new();
        let mut p = parts(&rec);
        p.rs485.reject_config = Some(ConfigError::UnsupportedBaud(115_200));

        let Err(failure) = Bridge::start(p, &slots, BridgeConfig::REFERENCE) else {
            panic!("startup should fail");
        };
        assert_eq!(
            *failure.error(),
            InitError::Configure {
                endpoint: EndpointId::Rs485,
                source: ConfigError::UnsupportedBaud(115_200),
            }
        );
        assert_eq!(
            rec.take(),
            vec![
                Event::Configure(EndpointId::Usb),
                Event::Configure(EndpointId::Rs485),
            ]
        );

        // Traffic after the failure is never picked up.
        assert!(!slots.on_receive_complete(EndpointId::Usb, 0x41));

        let mut blink = failure.into_blink();
        for _ in 0..4 {
            blink.blink_once();
        }
        assert_eq!(
            rec.take(),
            vec![
                Event::Toggle,
                Event::Delay(100),
                Event::Toggle,
                Event::Delay(100),
                Event::Toggle,
                Event::Delay(100),
                Event::Toggle,
                Event::Delay(100),
            ]
        );
        assert_eq!(blink.indicator().toggles, 4);
    }
}
