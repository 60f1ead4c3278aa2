//! Randomized operation sequences checked against the standard invariants.
//!
//! # Architecture
//!
//! ```text
//! proptest generates: Vec<Operation>
//!                          │
//!                          ▼
//!                  Scenario (SimEnv)
//!                          │
//!                          ▼
//!          SystemSnapshot ─► InvariantRegistry
//! ```
//!
//! Whatever order senders are created, broadcast, publish and idle in, the
//! persisted state must stay consistent, and every packet an infected,
//! published sender broadcast today must be confirmed by the matcher.

use std::collections::HashSet;

use proptest::prelude::*;
use tracekey_core::Environment;
use tracekey_harness::{InvariantRegistry, Scenario, SimServer, SystemSnapshot};

#[derive(Debug, Clone)]
enum Operation {
    AddSender { infected: bool },
    Broadcast { sender: usize },
    Publish { sender: usize },
    AdvanceDays(u32),
    AdvanceMinutes(u32),
    Receive,
}

fn operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        1 => any::<bool>().prop_map(|infected| Operation::AddSender { infected }),
        4 => (0usize..8).prop_map(|sender| Operation::Broadcast { sender }),
        2 => (0usize..8).prop_map(|sender| Operation::Publish { sender }),
        1 => (1u32..4).prop_map(Operation::AdvanceDays),
        2 => (1u32..600).prop_map(Operation::AdvanceMinutes),
        1 => Just(Operation::Receive),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_invariants_hold_for_any_sequence(
        seed in any::<u64>(),
        operations in prop::collection::vec(operation(), 1..30),
    ) {
        let mut scenario = Scenario::new(seed).unwrap();
        let registry = InvariantRegistry::standard();
        // Packets broadcast by senders that are infected
        let mut infected_packets = HashSet::new();
        let mut published = HashSet::new();

        for (step, operation) in operations.iter().enumerate() {
            let senders = scenario.senders().len();
            match operation {
                Operation::AddSender { infected } => {
                    scenario.add_sender(*infected).unwrap();
                },
                Operation::Broadcast { sender } if *sender < senders => {
                    let packet = scenario.broadcast(*sender).unwrap();
                    if scenario.sender(*sender).as_infected().is_some() {
                        infected_packets.insert((*sender, scenario.env().today(), packet.to_bytes()));
                    }
                },
                Operation::Publish { sender } if *sender < senders => {
                    if scenario.publish_infected(*sender).unwrap() {
                        published.insert(*sender);
                    }
                },
                Operation::AdvanceDays(days) => scenario.env().advance_days(*days),
                Operation::AdvanceMinutes(minutes) => scenario.env().advance_minutes(*minutes),
                Operation::Receive => {
                    let (packets, matches) = scenario.receive().unwrap();
                    prop_assert!(matches.is_empty() || matches.len() == packets.len());
                    prop_assert!(matches.iter().filter(|m| m.matched).all(|m| m.is_confirmed()));
                },
                Operation::Broadcast { .. } | Operation::Publish { .. } => {},
            }

            let snapshot = SystemSnapshot::capture(&scenario).unwrap();
            if let Err(violations) = registry.check_all(&snapshot) {
                prop_assert!(false, "step {step} {operation:?}: {violations:?}");
            }
        }

        // Receivers match against today's SKs only
        let today = scenario.env().today();
        let (packets, matches) = scenario.receive().unwrap();
        for (index, packet) in packets.iter().enumerate() {
            let from_published = infected_packets.iter().any(|(sender, day, bytes)| {
                published.contains(sender) && *day == today && *bytes == packet.to_bytes()
            });
            if from_published {
                prop_assert!(matches[index].is_confirmed(), "packet {index} not confirmed");
            }
        }

        let mut server = SimServer::new();
        let verdicts = scenario.receive_and_report(&mut server, false).unwrap();
        prop_assert_eq!(server.confirmed().len(), verdicts.len());
    }
}
