//! Barrier completion specs
//!
//! Once every enrolled participant is ready, exactly one completion reaches all of them,
//! and no two participants ever disagree about which barrier fired.

use crate::prelude::*;

#[test]
fn every_participant_sees_every_completion() {
    init_logging();
    let base = barrier("everyone");
    let mut handles = vec![base.create_handle(true).unwrap()];
    for _ in 0..4 {
        handles.push(base.create_handle(false).unwrap());
    }
    let rounds = 20;

    let outcomes: Vec<Vec<Outcome>> = std::thread::scope(|s| {
        let workers: Vec<_> = handles
            .iter()
            .map(|handle| {
                s.spawn(move || {
                    (0..rounds)
                        .map(|_| handle.sync().unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });

    for per_process in &outcomes {
        assert_eq!(per_process, &vec![Outcome::Success; rounds]);
    }
    let snapshot = base.snapshot().unwrap();
    assert_eq!(snapshot.generation, rounds as u64);
    assert_eq!(snapshot.last_outcome, Some(Outcome::Success));
    assert_eq!(snapshot.watchdog, None);
}

#[test]
fn competing_barriers_fire_consistently() {
    init_logging();
    let first = barrier("first");
    let second = barrier("second");
    let processes = 3;
    let rounds = 10;

    let groups: Vec<_> = (0..processes)
        .map(|_| {
            (
                GuardGroup::new(vec![first.create_handle(false).unwrap()]),
                GuardGroup::new(vec![second.create_handle(false).unwrap()]),
            )
        })
        .collect();

    let choices: Vec<Vec<usize>> = std::thread::scope(|s| {
        let workers: Vec<_> = groups
            .iter()
            .map(|(a, b)| {
                s.spawn(move || {
                    let mut alt = Alternative::new(vec![Box::new(a.clone()), Box::new(b.clone())]);
                    (0..rounds)
                        .map(|_| {
                            let index = alt.fair_select().unwrap();
                            let group = if index == 0 { a } else { b };
                            assert_eq!(group.outcome(), Some(Outcome::Success));
                            index
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });

    for per_process in &choices[1..] {
        similar_asserts::assert_eq!(per_process, &choices[0]);
    }
    let fired = first.generation().unwrap() + second.generation().unwrap();
    assert_eq!(fired, rounds as u64);
}

#[test]
fn resigning_straggler_releases_the_rest() {
    let base = barrier("straggler");
    let waiting = base.create_handle(true).unwrap();
    let straggler = base.create_handle(true).unwrap();

    let worker = std::thread::spawn(move || waiting.sync());
    std::thread::sleep(Duration::from_millis(20));
    assert!(!worker.is_finished());
    assert_eq!(base.aggregate_status().unwrap(), BarrierStatus::NotReady);

    straggler.resign().unwrap();
    assert_eq!(worker.join().unwrap().unwrap(), Outcome::Success);
    assert_eq!(base.generation().unwrap(), 1);
}

#[test]
fn dropped_handles_leave_the_barrier_usable() {
    let base = barrier("dropped");
    let keeper = base.create_handle(false).unwrap();
    {
        let _visitor = base.create_handle(false).unwrap();
        assert_eq!(base.snapshot().unwrap().altable, 2);
    }
    assert_eq!(base.snapshot().unwrap().altable, 1);
    assert_eq!(keeper.sync().unwrap(), Outcome::Success);
}
