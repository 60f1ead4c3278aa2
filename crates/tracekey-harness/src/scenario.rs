//! Multi-party scenarios over in-memory stores.
//!
//! A [`Scenario`] wires one provisioning authority, any number of senders and
//! a single receiver to one shared [`SimEnv`]. Tests drive it step by step
//! (broadcast, publish, advance time, receive) and inspect the stores.

use chrono::NaiveDate;
use tracekey_core::{
    BroadcastSecret, EphemeralIdScheduler, Environment, Error, Identity, InfectedRoster,
    MemoryStore, Packet, PacketLog, PacketMatch, ReportTransport, ReportVerdict, match_packets,
    next_packet, report_matches,
};
use tracekey_crypto::Schedule;

use crate::SimEnv;

/// Index of a sender within a scenario.
pub type SenderId = usize;

/// One sender and the day its SK chain started.
pub struct SimSender {
    /// The sender's identity over its own store
    pub identity: Identity<MemoryStore>,
    /// Day the identity was opened and its first SK drawn
    pub created_on: NaiveDate,
}

/// Authority, senders and receiver sharing one simulated environment.
pub struct Scenario {
    env: SimEnv,
    authority: MemoryStore,
    scheduler: EphemeralIdScheduler,
    senders: Vec<SimSender>,
    receiver: MemoryStore,
}

impl Scenario {
    /// Scenario with the default schedule and a fresh broadcast secret.
    pub fn new(seed: u64) -> Result<Self, Error> {
        Self::with_schedule(seed, Schedule::default())
    }

    /// Scenario with a custom EphID window.
    pub fn with_schedule(seed: u64, schedule: Schedule) -> Result<Self, Error> {
        let env = SimEnv::with_seed(seed);
        let authority = MemoryStore::new();
        BroadcastSecret::provision(&authority, schedule, &env)?;
        let scheduler = EphemeralIdScheduler::new(BroadcastSecret::load(&authority, schedule)?);

        Ok(Self { env, authority, scheduler, senders: Vec::new(), receiver: MemoryStore::new() })
    }

    /// Shared environment.
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    /// Scheduler over the provisioned broadcast secret.
    pub fn scheduler(&self) -> &EphemeralIdScheduler {
        &self.scheduler
    }

    /// Store holding the broadcast secret.
    pub fn authority(&self) -> &MemoryStore {
        &self.authority
    }

    /// The receiver's store (packet log and roster).
    pub fn receiver(&self) -> &MemoryStore {
        &self.receiver
    }

    /// All senders in creation order.
    pub fn senders(&self) -> &[SimSender] {
        &self.senders
    }

    /// Open a new sender with its own store and initialize its SK.
    pub fn add_sender(&mut self, infected: bool) -> Result<SenderId, Error> {
        let identity = Identity::open(MemoryStore::new(), infected, &self.env)?;
        identity.current_sk(&self.env)?;
        self.senders.push(SimSender { identity, created_on: self.env.today() });
        Ok(self.senders.len() - 1)
    }

    /// The sender's identity.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not returned by [`add_sender`](Self::add_sender).
    pub fn sender(&self, id: SenderId) -> &Identity<MemoryStore> {
        &self.senders[id].identity
    }

    /// Sender `id` broadcasts its current packet; the receiver logs it.
    pub fn broadcast(&self, id: SenderId) -> Result<Packet, Error> {
        let packet = next_packet(&self.scheduler, self.sender(id), &self.env)?;
        PacketLog::new(self.receiver.clone()).record(&packet)?;
        Ok(packet)
    }

    /// Sender `id` declares itself infected to the receiver.
    ///
    /// Returns `Ok(false)` for senders that are not infected or already listed.
    pub fn publish_infected(&self, id: SenderId) -> Result<bool, Error> {
        let Some(infected) = self.sender(id).as_infected() else {
            return Ok(false);
        };
        let sk = infected.current_sk(&self.env)?;
        InfectedRoster::new(self.receiver.clone()).publish(
            infected.key_pair().public_key(),
            &sk,
            self.env.today(),
        )
    }

    /// Receiver matches its packet log against the roster.
    pub fn receive(&self) -> Result<(Vec<Packet>, Vec<PacketMatch>), Error> {
        let entries = InfectedRoster::new(self.receiver.clone()).load(self.env.today())?;
        let packets = PacketLog::new(self.receiver.clone()).read_all()?;
        let matches = match_packets(&self.scheduler, &entries, &packets)?;
        Ok((packets, matches))
    }

    /// Receive, then report every match over `transport`.
    pub fn receive_and_report<T: ReportTransport>(
        &self,
        transport: &mut T,
        tamper: bool,
    ) -> Result<Vec<ReportVerdict>, Error> {
        let (packets, matches) = self.receive()?;
        let responses = report_matches(&matches, &packets, transport, tamper)?;

        Ok(responses
            .iter()
            .map(|response| {
                ReportVerdict::from_response(response).unwrap_or(ReportVerdict::Malformed)
            })
            .collect())
    }
}
