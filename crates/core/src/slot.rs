// RS485 Bridge - USB/RS485 Serial Bridge Firmware
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Single-byte receive slots shared between interrupt handlers and the loop.
//!
//! Every field here has exactly one writer per value: the interrupt handler
//! only ever sets the completion flag and clears `armed`, the loop only ever
//! clears the flag and sets `armed`. Plain loads and stores are therefore
//! enough, which keeps the slots usable on cores without atomic
//! read-modify-write instructions.

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::endpoint::EndpointId;

/// "Byte ready" signal from interrupt context to the main loop.
#[derive(Debug)]
pub struct CompletionFlag(AtomicBool);

impl CompletionFlag {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Interrupt side.
    pub fn set(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Loop side.
    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for CompletionFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// One endpoint's receive slot.
///
/// Lifecycle: armed -> byte stored, flag set, disarmed -> taken by the loop
/// -> armed again. A byte that arrives while the slot is not armed is dropped.
#[derive(Debug)]
pub struct ReceiveSlot {
    byte: AtomicU8,
    armed: AtomicBool,
    complete: CompletionFlag,
}

impl ReceiveSlot {
    pub const fn new() -> Self {
        Self {
            byte: AtomicU8::new(0),
            armed: AtomicBool::new(false),
            complete: CompletionFlag::new(),
        }
    }

    /// Interrupt side: latch `byte` if a receive was requested.
    ///
    /// Returns `false` when the byte was dropped because the previous one has
    /// not been consumed and re-armed yet.
    pub fn on_receive_complete(&self, byte: u8) -> bool {
        if !self.armed.load(Ordering::Acquire) {
            return false;
        }
        self.byte.store(byte, Ordering::Relaxed);
        // Flag before disarm: once the loop sees `armed == false` the flag is final.
        self.complete.set();
        self.armed.store(false, Ordering::Release);
        true
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    pub fn is_pending(&self) -> bool {
        self.complete.is_set()
    }

    /// Loop side: request the next byte.
    ///
    /// No-op while already armed or while a received byte is still pending.
    /// Returns whether a new request was made.
    pub(crate) fn arm(&self) -> bool {
        if self.armed.load(Ordering::Acquire) || self.complete.is_set() {
            return false;
        }
        self.armed.store(true, Ordering::Release);
        true
    }

    /// Loop side: consume the pending byte, if any.
    pub(crate) fn take(&self) -> Option<u8> {
        if !self.complete.is_set() {
            return None;
        }
        let byte = self.byte.load(Ordering::Relaxed);
        self.complete.clear();
        Some(byte)
    }
}

impl Default for ReceiveSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Receive slots for both endpoints, indexed by [`EndpointId`].
///
/// Interrupt handlers resolve their endpoint once and dispatch through
/// [`ReceiveSlots::on_receive_complete`].
#[derive(Debug, Default)]
pub struct ReceiveSlots {
    slots: [ReceiveSlot; EndpointId::COUNT],
}

impl ReceiveSlots {
    pub const fn new() -> Self {
        Self {
            slots: [ReceiveSlot::new(), ReceiveSlot::new()],
        }
    }

    pub fn slot(&self, id: EndpointId) -> &ReceiveSlot {
        &self.slots[id.index()]
    }

    /// Receive-complete entry point for interrupt handlers.
    pub fn on_receive_complete(&self, id: EndpointId, byte: u8) -> bool {
        self.slot(id).on_receive_complete(byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_flag() {
        let flag = CompletionFlag::new();
        assert!(!flag.is_set());
        flag.set();
        assert!(flag.is_set());
        flag.set();
        assert!(flag.is_set());
        flag.clear();
        assert!(!flag.is_set());
    }

    #[test]
    fn test_unarmed_slot_drops_bytes() {
        let slot = ReceiveSlot::new();
        assert!(!slot.on_receive_complete(0x10));
        assert!(!slot.is_pending());
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn test_slot_lifecycle() {
        let slot = ReceiveSlot::new();
        assert!(slot.arm());
        assert!(slot.is_armed());

        assert!(slot.on_receive_complete(0x41));
        assert!(!slot.is_armed());
        assert!(slot.is_pending());

        // Second byte before the first is consumed is an overrun.
        assert!(!slot.on_receive_complete(0x42));

        assert_eq!(slot.take(), Some(0x41));
        assert!(!slot.is_pending());
        assert_eq!(slot.take(), None);

        assert!(slot.arm());
        assert!(slot.on_receive_complete(0x43));
        assert_eq!(slot.take(), Some(0x43));
    }

    #[test]
    fn test_arm_is_idempotent() {
        let slot = ReceiveSlot::new();
        assert!(slot.arm());
        assert!(!slot.arm());
        assert!(slot.is_armed());

        assert!(slot.on_receive_complete(0x55));
        // Re-arming with a byte pending must neither re-open the slot nor lose the flag.
        assert!(!slot.arm());
        assert!(!slot.is_armed());
        assert!(slot.is_pending());
        assert!(!slot.on_receive_complete(0x66));
        assert_eq!(slot.take(), Some(0x55));
    }

    #[test]
    fn test_slots_dispatch_by_endpoint() {
        let slots = ReceiveSlots::new();
        assert!(slots.slot(EndpointId::Usb).arm());

        assert!(slots.on_receive_complete(EndpointId::Usb, 0x01));
        assert!(!slots.on_receive_complete(EndpointId::Rs485, 0x02));

        assert!(slots.slot(EndpointId::Usb).is_pending());
        assert!(!slots.slot(EndpointId::Rs485).is_pending());
    }
}
