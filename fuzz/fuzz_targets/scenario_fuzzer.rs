//! Fuzz target for multi-day sender/receiver scenarios
//!
//! # Strategy
//!
//! - Arbitrary sequences of sender creation, broadcasts, roster publication,
//!   clock movement and matching
//! - Deterministic SimEnv seeded from the input
//!
//! # Invariants
//!
//! - No operation errors or panics on well-formed state
//! - The standard invariant registry holds after every step

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tracekey_harness::{InvariantRegistry, Scenario, SystemSnapshot};

#[derive(Debug, Arbitrary)]
enum Operation {
    AddSender { infected: bool },
    Broadcast { sender: u8 },
    Publish { sender: u8 },
    AdvanceDays(u8),
    AdvanceMinutes(u16),
    Receive,
}

#[derive(Debug, Arbitrary)]
struct Input {
    seed: u64,
    operations: Vec<Operation>,
}

fuzz_target!(|input: Input| {
    let Ok(mut scenario) = Scenario::new(input.seed) else {
        return;
    };
    let registry = InvariantRegistry::standard();

    for operation in input.operations.iter().take(64) {
        let senders = scenario.senders().len();
        let result = match operation {
            Operation::AddSender { infected } if senders < 8 => {
                scenario.add_sender(*infected).map(|_| ())
            },
            Operation::Broadcast { sender } if usize::from(*sender) < senders => {
                scenario.broadcast(usize::from(*sender)).map(|_| ())
            },
            Operation::Publish { sender } if usize::from(*sender) < senders => {
                scenario.publish_infected(usize::from(*sender)).map(|_| ())
            },
            Operation::AdvanceDays(days) => {
                scenario.env().advance_days(u32::from(*days % 4));
                Ok(())
            },
            Operation::AdvanceMinutes(minutes) => {
                scenario.env().advance_minutes(u32::from(*minutes % 1440));
                Ok(())
            },
            Operation::Receive => scenario.receive().map(|_| ()),
            _ => Ok(()),
        };
        assert!(result.is_ok(), "{operation:?} failed: {result:?}");

        let snapshot = SystemSnapshot::capture(&scenario);
        assert!(snapshot.is_ok(), "snapshot failed: {snapshot:?}");
        if let Ok(snapshot) = snapshot {
            if let Err(violations) = registry.check_all(&snapshot) {
                panic!("{operation:?} broke invariants: {violations:?}");
            }
        }
    }
});
