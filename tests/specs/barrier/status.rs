//! Handle status specs
//!
//! Status writes through a handle obey the trump order and are idempotent, and the
//! barrier's aggregate follows its participants.

use crate::prelude::*;
use proptest::prelude::*;

fn any_status() -> impl Strategy<Value = HandleStatus> {
    prop_oneof![
        Just(HandleStatus::ImplicitReady),
        Just(HandleStatus::ExplicitReady),
        Just(HandleStatus::ImplicitNotReady),
        Just(HandleStatus::ExplicitNotReady),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn repeated_writes_are_idempotent(
        start in any_status(),
        write in any_status(),
        repeats in 1usize..5,
    ) {
        let base = barrier("idempotent");
        let once = base.create_handle(false).unwrap();
        let many = base.create_handle(false).unwrap();
        once.set_status(start).unwrap();
        many.set_status(start).unwrap();

        once.set_status(write).unwrap();
        for _ in 0..repeats {
            many.set_status(write).unwrap();
        }
        prop_assert_eq!(once.status().unwrap(), many.status().unwrap());
        prop_assert_eq!(once.status().unwrap(), HandleStatus::merge(start, write));
    }
}

#[test]
fn explicit_ready_is_sticky_until_reset() {
    let base = barrier("sticky");
    let handle = base.create_handle(false).unwrap();

    handle.set_status(HandleStatus::ExplicitReady).unwrap();
    for status in [
        HandleStatus::ImplicitReady,
        HandleStatus::ImplicitNotReady,
        HandleStatus::ExplicitNotReady,
    ] {
        handle.set_status(status).unwrap();
        assert_eq!(handle.status().unwrap(), HandleStatus::ExplicitReady);
    }

    handle.reset_status().unwrap();
    assert_eq!(handle.status().unwrap(), HandleStatus::ImplicitNotReady);
}

#[test]
fn aggregate_tracks_committed_and_altable_participants() {
    let base = barrier("aggregate");
    assert_eq!(base.aggregate_status().unwrap(), BarrierStatus::NotSyncingNow);

    let committed = base.create_handle(true).unwrap();
    assert_eq!(base.aggregate_status().unwrap(), BarrierStatus::NotReady);

    let altable = base.create_handle(false).unwrap();
    committed.resign().unwrap();
    assert_eq!(base.aggregate_status().unwrap(), BarrierStatus::NotSyncingNow);

    altable.resign().unwrap();
    assert_eq!(base.aggregate_status().unwrap(), BarrierStatus::NotSyncingNow);
    assert!(matches!(
        altable.status(),
        Err(CspError::Usage(UsageFault::Resigned { .. }))
    ));
}
