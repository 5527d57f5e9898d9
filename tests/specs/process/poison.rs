//! Poison and cleanup specs
//!
//! A process shut down by poison resigns from its barriers on the way out, so the
//! processes left behind can keep synchronising without it.

use crate::prelude::*;

#[test]
fn poisoned_process_resigns_and_peers_carry_on() {
    init_logging();
    let base = barrier("survivors");
    let leaving = base.create_handle(false).unwrap();
    let staying = base.create_handle(false).unwrap();
    let (out, input) = one2one_with_immunity::<u32>(1);

    let mut network = Parallel::named("network").with(process("leaver", move || {
        let group = GuardGroup::new(vec![leaving.clone()]);
        let mut alt = Alternative::new(vec![Box::new(group), Box::new(input.guard())]);
        loop {
            if alt.pri_select()? == 1 {
                if let Err(e) = input.read() {
                    leaving.resign()?;
                    return Err(e);
                }
            }
        }
    }));

    let poisoner = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        assert!(!out.poison(1));
        assert!(out.poison(3));
    });
    let result = network.run();
    poisoner.join().unwrap();

    assert_eq!(result, Err(CspError::Poisoned { strength: 3 }));
    let snapshot = base.snapshot().unwrap();
    assert_eq!(snapshot.altable, 1);
    assert_eq!(snapshot.generation, 0);
    assert_eq!(staying.sync().unwrap(), Outcome::Success);
}

#[test]
fn poison_is_forwarded_through_a_pipeline() {
    let (first_out, first_in) = one2one::<u32>();
    let (second_out, second_in) = one2one::<u32>();

    let mut network = Parallel::named("pipeline")
        .with(process("relay", move || loop {
            match first_in.read() {
                Ok(value) => second_out.write(value + 1)?,
                Err(CspError::Poisoned { strength }) => {
                    second_out.poison(strength);
                    return Err(CspError::Poisoned { strength });
                }
                Err(e) => return Err(e),
            }
        }))
        .with(process("sink", move || {
            assert_eq!(second_in.read()?, 2);
            second_in.read().map(|_| ())
        }))
        .with(process("source", move || {
            first_out.write(1)?;
            first_out.poison(MAX_STRENGTH);
            Ok(())
        }));

    let result = network.run();
    assert_eq!(
        result,
        Err(CspError::Poisoned {
            strength: MAX_STRENGTH
        })
    );
}

#[test]
fn panicking_member_is_reported_by_name() {
    let mut network = Parallel::named("fragile")
        .with(process("steady", || Ok(())))
        .with(process("fragile-member", || panic!("boom")));

    assert_eq!(
        network.run(),
        Err(CspError::ProcessPanicked {
            name: "fragile-member".to_string()
        })
    );
}
