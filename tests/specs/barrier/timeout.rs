//! Timeout specs
//!
//! A selection left pending by a participant that is still scanning is resolved either
//! by that participant finishing its scan or by the watchdog, whichever reaches the
//! gatekeeper first. Both sides always agree on the result.

use crate::prelude::*;

/// Run a peer's alternation as [group, stall] on a thread and wait until it is stalled
fn stalled_peer(handle: BarrierHandle) -> (Stall, GuardGroup, std::thread::JoinHandle<usize>) {
    let stall = Stall::new();
    let group = GuardGroup::new(vec![handle]);
    let worker = {
        let stall = stall.clone();
        let group = group.clone();
        std::thread::spawn(move || {
            let mut alt = Alternative::new(vec![Box::new(group), Box::new(stall)]);
            alt.pri_select().unwrap()
        })
    };
    stall.wait_until_entered();
    (stall, group, worker)
}

#[test]
fn watchdog_times_out_a_stalled_peer() {
    init_logging();
    let base = barrier_with_delay("stalled", Duration::from_millis(10));
    let mine = GuardGroup::new(vec![base.create_handle(false).unwrap()]);
    let (stall, peer_group, peer) = stalled_peer(base.create_handle(false).unwrap());

    assert_eq!(select_group(&mine), Some(Outcome::Timeout));
    assert_eq!(base.last_outcome().unwrap(), Some(Outcome::Timeout));

    // The stalled peer sees the same resolution once it finishes scanning
    stall.release();
    assert_eq!(peer.join().unwrap(), 0);
    assert_eq!(peer_group.outcome(), Some(Outcome::Timeout));
    assert_eq!(base.generation().unwrap(), 1);
}

#[test]
fn peer_finishing_its_scan_beats_the_watchdog() {
    init_logging();
    let base = barrier("racing");
    let mine = GuardGroup::new(vec![base.create_handle(false).unwrap()]);
    let (stall, peer_group, peer) = stalled_peer(base.create_handle(false).unwrap());

    let mine_worker = {
        let mine = mine.clone();
        std::thread::spawn(move || select_group(&mine))
    };
    eventually("a pending selection", || {
        base.aggregate_status().unwrap() == BarrierStatus::Selected
    });
    let dog = base.watchdog().unwrap().unwrap();
    assert_eq!(dog.state(), WatchdogState::Armed);

    stall.release();
    assert_eq!(mine_worker.join().unwrap(), Some(Outcome::Success));
    assert_eq!(peer.join().unwrap(), 0);
    assert_eq!(peer_group.outcome(), Some(Outcome::Success));

    assert!(dog.is_killed());
    assert_eq!(base.watchdog().unwrap().map(|d| d.state()), None);
    assert_eq!(base.last_outcome().unwrap(), Some(Outcome::Success));
}

#[test]
fn manual_timeout_without_pending_selection_is_a_noop() {
    let base = barrier("idle");
    let _a = base.create_handle(false).unwrap();
    let _b = base.create_handle(false).unwrap();

    assert_eq!(base.timeout().unwrap(), 0);
    assert_eq!(base.generation().unwrap(), 0);
    assert_eq!(base.last_outcome().unwrap(), None);
}

#[test]
fn committed_participants_outlast_a_timeout() {
    let base = barrier_with_delay("mixed", Duration::from_millis(10));
    let committed = base.create_handle(true).unwrap();
    let mine = GuardGroup::new(vec![base.create_handle(false).unwrap()]);
    let peer_handle = base.create_handle(false).unwrap();
    let waiter = std::thread::spawn(move || committed.sync());
    eventually("committed participant to arrive", || {
        base.aggregate_status().unwrap() != BarrierStatus::NotReady
    });

    let (stall, peer_group, peer) = stalled_peer(peer_handle);
    assert_eq!(select_group(&mine), Some(Outcome::Timeout));
    stall.release();
    peer.join().unwrap();
    assert!(!waiter.is_finished());

    // Both altable participants leave; the committed one completes alone
    drop(mine);
    drop(peer_group);
    assert_eq!(waiter.join().unwrap().unwrap(), Outcome::Success);
}
