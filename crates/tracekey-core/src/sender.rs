//! Sender side: build the packet broadcast at the current minute.

use tracing::trace;

use crate::{
    env::Environment,
    error::Error,
    identity::Identity,
    packet::Packet,
    scheduler::EphemeralIdScheduler,
    store::Store,
};

/// Build the packet `identity` broadcasts right now.
///
/// Rotates the SK, loads or regenerates the daily ciphertext, picks the EphID
/// for the current minute and signs it (infected) or attaches the zero
/// sentinel (not infected).
pub fn next_packet<S: Store, E: Environment>(
    scheduler: &EphemeralIdScheduler,
    identity: &Identity<S>,
    env: &E,
) -> Result<Packet, Error> {
    let ciphertext = scheduler.daily_ciphertext(identity, env)?;
    let minute = env.minutes_since_midnight();
    let ephid = scheduler.active_ephid(&ciphertext, minute)?;
    let signature = identity.sign_or_sentinel(&ephid);

    trace!(minute, ?ephid, "built packet");
    Ok(Packet { iv: ciphertext.iv(), ephid, signature })
}
