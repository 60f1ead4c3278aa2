//! Node commands.
//!
//! Each command is a plain function over an [`Environment`] and one open
//! [`Store`] per role, so the binary and the tests drive the same code.

use std::path::Path;

use tracekey_core::{
    BroadcastSecret, EphemeralIdScheduler, Environment, Identity, InfectedRoster, Packet,
    PacketLog, ReportVerdict, Store, match_packets, next_packet, report_matches,
};
use tracekey_crypto::Schedule;
use tracing::{debug, info, warn};

use crate::{config::Stores, error::NodeError, transport::LoopbackTransport};

/// Result of [`send`].
#[derive(Debug, Clone)]
pub struct SendOutcome {
    /// Packet broadcast in the current window
    pub packet: Packet,
    /// Whether the receiver logged it (false for a repeat in the same window)
    pub recorded: bool,
    /// Whether the sender was newly added to the infected roster
    pub published: bool,
}

/// Result of [`receive`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiveOutcome {
    /// Packets in the receiver's log
    pub packets: usize,
    /// Packets that matched an infected identity
    pub matched: usize,
    /// Server verdict for each report sent, in packet order
    pub verdicts: Vec<ReportVerdict>,
}

/// Create the broadcast secret, or replace one sized for another window.
///
/// Returns whether a new secret was written.
pub fn provision<S: Store, E: Environment>(
    stores: &Stores<S>,
    schedule: Schedule,
    env: &E,
) -> Result<bool, NodeError> {
    Ok(BroadcastSecret::provision(&stores.authority, schedule, env)?)
}

/// Broadcast the current packet to the receiver.
///
/// Infected senders also publish their public key and today's SK to the
/// receiver's roster.
///
/// # Errors
///
/// - `MissingRequiredState`: if the broadcast secret was never provisioned
/// - any storage or key error from the sender's state
pub fn send<S: Store, E: Environment>(
    stores: &Stores<S>,
    schedule: Schedule,
    env: &E,
    infected: bool,
) -> Result<SendOutcome, NodeError> {
    let scheduler = EphemeralIdScheduler::new(BroadcastSecret::load(&stores.authority, schedule)?);
    let identity = Identity::open(stores.sender(infected).clone(), infected, env)?;

    let packet = next_packet(&scheduler, &identity, env)?;
    let recorded = PacketLog::new(stores.receiver.clone()).record(&packet)?;

    let published = match identity.as_infected() {
        Some(infected) => InfectedRoster::new(stores.receiver.clone()).publish(
            infected.key_pair().public_key(),
            &infected.current_sk(env)?,
            env.today(),
        )?,
        None => false,
    };

    info!(infected, recorded, published, ephid = ?packet.ephid, "sent packet");
    Ok(SendOutcome { packet, recorded, published })
}

/// Match the receiver's packet log against the roster and report contacts.
///
/// Reports go to the in-process server backed by the server store. With
/// `adversary` set every report carries a corrupted signature.
pub fn receive<S: Store, E: Environment>(
    stores: &Stores<S>,
    schedule: Schedule,
    env: &E,
    adversary: bool,
) -> Result<ReceiveOutcome, NodeError> {
    let scheduler = EphemeralIdScheduler::new(BroadcastSecret::load(&stores.authority, schedule)?);
    let entries = InfectedRoster::new(stores.receiver.clone()).load(env.today())?;
    let packets = PacketLog::new(stores.receiver.clone()).read_all()?;

    if entries.is_empty() {
        warn!(packets = packets.len(), "no infected identities published, nothing to match");
    }

    let matches = match_packets(&scheduler, &entries, &packets)?;
    let matched = matches.iter().filter(|m| m.matched).count();
    debug!(packets = packets.len(), matched, "matched packet log");

    let mut transport = LoopbackTransport::new(stores.server.clone());
    let responses = report_matches(&matches, &packets, &mut transport, adversary)?;

    let verdicts = responses
        .iter()
        .map(|response| ReportVerdict::from_response(response).unwrap_or(ReportVerdict::Malformed))
        .collect::<Vec<_>>();

    for (verdict, response) in verdicts.iter().zip(&responses) {
        info!(?verdict, response = %String::from_utf8_lossy(response), "report answered");
    }

    Ok(ReceiveOutcome { packets: packets.len(), matched, verdicts })
}

/// Evaluate a raw report message stored in `path`.
///
/// # Errors
///
/// - `Io`: if the file cannot be read
pub fn check_report(path: &Path) -> Result<ReportVerdict, NodeError> {
    let message = std::fs::read(path)
        .map_err(|source| NodeError::Io { path: path.to_path_buf(), source })?;

    let verdict = ReportVerdict::evaluate(&message);
    info!(?verdict, bytes = message.len(), "checked report");
    Ok(verdict)
}
