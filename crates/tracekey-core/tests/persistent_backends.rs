//! Key-schedule state across process restarts
//!
//! Each test drives the protocol against an on-disk backend, drops every
//! handle, reopens the backend and checks that the state picked up where it
//! left off.

use chrono::NaiveDate;
use tracekey_core::{
    BroadcastSecret, ChaoticStore, DirStore, EphemeralIdScheduler, Environment, Identity,
    InfectedRoster, MemoryStore, PacketLog, RedbStore, Store, crypto::Schedule, match_packets,
    next_packet, store::keys,
};

#[derive(Clone, Copy)]
struct Clock {
    today: NaiveDate,
    minute: u32,
    fill: u8,
}

impl Clock {
    fn on(day: u32) -> Self {
        Self { today: NaiveDate::from_ymd_opt(2025, 2, day).unwrap(), minute: 600, fill: 0x2D }
    }
}

impl Environment for Clock {
    fn today(&self) -> NaiveDate {
        self.today
    }

    fn minutes_since_midnight(&self) -> u32 {
        self.minute
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        buffer.fill(self.fill);
    }
}

fn send_and_match<S: Store>(sender: S, receiver: S, provisioning: S, env: &Clock) -> bool {
    BroadcastSecret::provision(&provisioning, Schedule::default(), env).unwrap();
    let scheduler =
        EphemeralIdScheduler::new(BroadcastSecret::load(&provisioning, Schedule::default()).unwrap());

    let identity = Identity::open(sender, true, env).unwrap();
    let packet = next_packet(&scheduler, &identity, env).unwrap();
    PacketLog::new(receiver.clone()).record(&packet).unwrap();

    let infected = identity.as_infected().unwrap();
    let roster = InfectedRoster::new(receiver.clone());
    roster
        .publish(infected.key_pair().public_key(), &infected.current_sk(env).unwrap(), env.today())
        .unwrap();

    let entries = roster.load(env.today()).unwrap();
    let packets = PacketLog::new(receiver).read_all().unwrap();
    let results = match_packets(&scheduler, &entries, &packets).unwrap();
    results.iter().all(|r| r.is_confirmed())
}

#[test]
fn dir_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let open = |name: &str| DirStore::open(dir.path().join(name)).unwrap();

    assert!(send_and_match(open("infected"), open("receiver"), open("authority"), &Clock::on(1)));

    // Three days later: SK files rotate on access, the match still holds
    let env = Clock::on(4);
    let sender = Identity::open(open("infected"), true, &env).unwrap();
    let sk = sender.current_sk(&env).unwrap();
    let entries = InfectedRoster::new(open("receiver")).load(env.today()).unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].sk, sk);
    let stamp = std::fs::read(dir.path().join("receiver").join("last_sk_infected_update")).unwrap();
    assert_eq!(stamp, b"2025-02-04");
}

#[test]
fn redb_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let paths = ["infected.redb", "receiver.redb", "authority.redb"].map(|f| dir.path().join(f));

    {
        let [s, r, a] = &paths;
        let open = |path: &std::path::PathBuf| RedbStore::open(path).unwrap();
        assert!(send_and_match(open(s), open(r), open(a), &Clock::on(10)));
    }

    let receiver = RedbStore::open(&paths[1]).unwrap();
    assert_eq!(PacketLog::new(receiver.clone()).read_all().unwrap().len(), 1);
    assert_eq!(receiver.get(keys::LAST_SK_INFECTED_UPDATE).unwrap(), Some(b"2025-02-10".to_vec()));
}

#[test]
fn storage_failures_surface_as_errors() {
    let env = Clock::on(1);
    let mut failures = 0;

    for seed in 0..50u64 {
        let sender = ChaoticStore::with_seed(MemoryStore::new(), 0.3, seed);
        let authority = MemoryStore::new();
        BroadcastSecret::provision(&authority, Schedule::default(), &env).unwrap();
        let scheduler =
            EphemeralIdScheduler::new(BroadcastSecret::load(&authority, Schedule::default()).unwrap());

        let outcome = Identity::open(sender.clone(), true, &env)
            .and_then(|identity| next_packet(&scheduler, &identity, &env));
        match outcome {
            Ok(_) => {
                assert_eq!(sender.failure_count(), 0);
                assert!(identity_is_complete(sender.inner()));
            },
            Err(err) => {
                assert!(matches!(err, tracekey_core::Error::Storage(_)), "unexpected error: {err}");
                assert!(sender.failure_count() > 0);
                failures += 1;
            },
        }
    }

    assert!(failures > 0);
}

fn identity_is_complete(store: &MemoryStore) -> bool {
    [keys::PRIVATE_KEY, keys::PUBLIC_KEY, keys::SK, keys::CIPHERTEXT]
        .iter()
        .all(|key| store.get(key).unwrap().is_some())
}
