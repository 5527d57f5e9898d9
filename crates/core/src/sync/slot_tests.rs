// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::Arc;

#[test]
fn offer_to_idle_slot_is_dropped() {
    let slot = Slot::new();
    assert!(!slot.offer(1));
    assert_eq!(slot.take(), None);
}

#[test]
fn offer_to_armed_slot_is_delivered_once() {
    let slot = Slot::new();
    slot.arm();
    assert!(slot.offer(1));
    assert!(!slot.offer(2));
    assert_eq!(slot.take(), Some(1));
    assert_eq!(slot.take(), None);
}

#[test]
fn arm_discards_stale_value() {
    let slot = Slot::new();
    slot.arm();
    slot.offer("stale");
    slot.arm();
    assert!(slot.is_armed());
    assert_eq!(slot.take(), None);
}

#[test]
fn disarm_returns_pending_value() {
    let slot = Slot::new();
    slot.arm();
    slot.offer(5);
    assert_eq!(slot.disarm(), Some(5));
    assert!(!slot.is_armed());
    assert!(!slot.offer(6));
}

#[test]
fn recv_blocks_until_offer() {
    let slot = Arc::new(Slot::new());
    slot.arm();

    let sender = {
        let slot = Arc::clone(&slot);
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            slot.offer(42)
        })
    };

    assert_eq!(slot.recv(), Some(42));
    assert!(sender.join().unwrap());
    assert!(!slot.is_filled());
}

#[test]
fn recv_returns_value_delivered_before_blocking() {
    let slot = Slot::new();
    slot.arm();
    slot.offer(7);
    assert_eq!(slot.recv(), Some(7));
}

#[test]
fn recv_timeout_gives_up_and_stays_armed() {
    let slot: Slot<u8> = Slot::new();
    assert_eq!(slot.recv_timeout(Duration::from_millis(10)), None);
    assert!(slot.is_armed());
}
