//! Priority traversal specs
//!
//! When several guards are ready at once, a priority select always takes the earliest
//! one, whether it is a barrier or a channel, and leaves the others untouched.

use crate::prelude::*;

/// A channel with a value waiting to be read, and the thread writing it
fn pending_channel(value: u32) -> (AltingChannelInput<u32>, std::thread::JoinHandle<()>) {
    let (out, input) = one2one();
    let writer = std::thread::spawn(move || out.write(value).unwrap());
    eventually("value to be pending", || input.pending());
    (input, writer)
}

#[test]
fn earlier_barrier_beats_ready_channel() {
    let base = barrier("solo");
    let group = GuardGroup::new(vec![base.create_handle(false).unwrap()]);
    let (input, writer) = pending_channel(1);

    let mut alt = Alternative::new(vec![Box::new(group.clone()), Box::new(input.guard())]);
    let picks: Vec<usize> = (0..5).map(|_| alt.pri_select().unwrap()).collect();

    similar_asserts::assert_eq!(picks, vec![0; 5]);
    assert_eq!(group.outcome(), Some(Outcome::Success));
    assert_eq!(base.generation().unwrap(), 5);
    assert!(input.pending());

    assert_eq!(input.read().unwrap(), 1);
    writer.join().unwrap();
}

#[test]
fn earlier_channel_beats_ready_barrier() {
    let base = barrier("solo");
    let group = GuardGroup::new(vec![base.create_handle(false).unwrap()]);
    let (input, writer) = pending_channel(2);

    let mut alt = Alternative::new(vec![Box::new(input.guard()), Box::new(group.clone())]);
    let picks: Vec<usize> = (0..5).map(|_| alt.pri_select().unwrap()).collect();

    similar_asserts::assert_eq!(picks, vec![0; 5]);
    assert_eq!(group.outcome(), None);
    assert_eq!(base.generation().unwrap(), 0);

    assert_eq!(input.read().unwrap(), 2);
    writer.join().unwrap();
}

#[test]
fn fair_select_rotates_between_ready_guards() {
    let first = barrier("first");
    let second = barrier("second");
    let mut alt = Alternative::new(vec![
        Box::new(GuardGroup::new(vec![first.create_handle(false).unwrap()])),
        Box::new(GuardGroup::new(vec![second.create_handle(false).unwrap()])),
    ]);

    let picks: Vec<usize> = (0..4).map(|_| alt.fair_select().unwrap()).collect();
    similar_asserts::assert_eq!(picks, vec![0, 1, 0, 1]);
    assert_eq!(first.generation().unwrap(), 2);
    assert_eq!(second.generation().unwrap(), 2);
}

#[test]
fn custom_traversal_sets_the_order() {
    struct Backwards;

    impl Traversal for Backwards {
        fn order(&self, len: usize) -> Vec<usize> {
            (0..len).rev().collect()
        }
    }

    let mut alt = Alternative::new(vec![Box::new(Skip), Box::new(Skip), Box::new(Skip)]);
    assert_eq!(alt.select_by(&mut Backwards).unwrap(), 2);
    assert_eq!(alt.select_by(&mut PriorityTraversal).unwrap(), 0);
}
