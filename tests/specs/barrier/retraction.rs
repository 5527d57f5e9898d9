//! Offer retraction specs
//!
//! A participant that selects some other guard withdraws its offer cleanly: the barrier
//! never fires on its behalf and can still complete later.

use crate::prelude::*;

#[test]
fn channel_selection_withdraws_barrier_offer() {
    init_logging();
    let base = barrier("retracted");
    let mine = base.create_handle(false).unwrap();
    let peer = base.create_handle(false).unwrap();
    let (out, input) = one2one::<u32>();

    let writer = std::thread::spawn(move || out.write(7));
    eventually("value to be pending", || input.pending());

    let group = GuardGroup::new(vec![mine.clone()]);
    let mut alt = Alternative::new(vec![Box::new(group.clone()), Box::new(input.guard())]);
    assert_eq!(alt.pri_select().unwrap(), 1);
    assert_eq!(input.read().unwrap(), 7);
    writer.join().unwrap().unwrap();

    assert_eq!(group.last_selected(), None);
    assert_eq!(mine.status().unwrap(), HandleStatus::ImplicitNotReady);
    assert_eq!(base.aggregate_status().unwrap(), BarrierStatus::NotSyncingNow);
    assert_eq!(base.generation().unwrap(), 0);

    let worker = std::thread::spawn(move || peer.sync());
    assert_eq!(mine.sync().unwrap(), Outcome::Success);
    assert_eq!(worker.join().unwrap().unwrap(), Outcome::Success);
    assert_eq!(base.generation().unwrap(), 1);
}

#[test]
fn explicit_not_ready_blocks_completion_until_reset() {
    let base = barrier("vetoed");
    let vetoing = base.create_handle(false).unwrap();
    let eager = base.create_handle(false).unwrap();

    vetoing.set_status(HandleStatus::ExplicitNotReady).unwrap();
    let group = GuardGroup::new(vec![vetoing.clone()]);

    let worker = std::thread::spawn(move || eager.sync());
    std::thread::sleep(Duration::from_millis(20));

    // Offering does not override an explicit veto, so only the timeout can fire
    let mut alt = Alternative::new(vec![
        Box::new(group.clone()),
        Box::new(TimeoutGuard::after(Duration::from_millis(30))),
    ]);
    assert_eq!(alt.pri_select().unwrap(), 1);
    assert_eq!(group.last_selected(), None);
    assert_eq!(vetoing.status().unwrap(), HandleStatus::ExplicitNotReady);
    assert!(!worker.is_finished());

    vetoing.reset_status().unwrap();
    assert_eq!(vetoing.sync().unwrap(), Outcome::Success);
    assert_eq!(worker.join().unwrap().unwrap(), Outcome::Success);
}

#[test]
fn losing_group_reports_nothing() {
    let busy = barrier("busy");
    let idle = barrier("idle");
    let peer = busy.create_handle(false).unwrap();
    let _absent = idle.create_handle(false).unwrap();

    let winner = GuardGroup::new(vec![busy.create_handle(false).unwrap()]);
    let loser = GuardGroup::new(vec![idle.create_handle(false).unwrap()]);

    let worker = std::thread::spawn(move || peer.sync());
    let mut alt = Alternative::new(vec![Box::new(loser.clone()), Box::new(winner.clone())]);
    assert_eq!(alt.pri_select().unwrap(), 1);
    worker.join().unwrap().unwrap();

    assert_eq!(winner.outcome(), Some(Outcome::Success));
    assert_eq!(loser.outcome(), None);
    assert_eq!(idle.generation().unwrap(), 0);
    assert_eq!(idle.aggregate_status().unwrap(), BarrierStatus::NotSyncingNow);
}
