//! The shared broadcast secret.
//!
//! Generated once by the provisioning authority and distributed to every
//! participant out of band. Senders encrypt it; receivers re-encrypt it to
//! recompute EphIDs. Its length is fixed by the [`Schedule`]: one block per
//! EphID window.

use tracekey_crypto::{BlockCipherCodec, Schedule};
use tracing::{info, warn};

use crate::{
    env::Environment,
    error::Error,
    store::{Store, keys},
};

/// Loading and provisioning of the broadcast secret.
#[derive(Debug, Clone, Copy)]
pub struct BroadcastSecret;

impl BroadcastSecret {
    /// Read the secret from `store` and build a codec over it.
    ///
    /// # Errors
    ///
    /// - `MissingRequiredState`: if no secret has been provisioned
    /// - `SizeMismatch`: if the secret does not fit `schedule`
    pub fn load<S: Store>(store: &S, schedule: Schedule) -> Result<BlockCipherCodec, Error> {
        let secret = store
            .get(keys::BROADCAST_KEY)?
            .ok_or(Error::MissingRequiredState { key: keys::BROADCAST_KEY })?;
        Ok(BlockCipherCodec::new(schedule, secret)?)
    }

    /// Ensure `store` holds a secret sized for `schedule`.
    ///
    /// An existing secret of the right length is kept; anything else is
    /// replaced by fresh random bytes. Returns whether a new secret was
    /// written.
    pub fn provision<S: Store, E: Environment>(
        store: &S,
        schedule: Schedule,
        env: &E,
    ) -> Result<bool, Error> {
        let expected = schedule.broadcast_secret_len();
        match store.get(keys::BROADCAST_KEY)? {
            Some(secret) if secret.len() == expected => return Ok(false),
            Some(secret) => {
                warn!(expected, actual = secret.len(), "replacing wrongly sized broadcast secret");
            },
            None => {},
        }

        let mut secret = vec![0u8; expected];
        env.random_bytes(&mut secret);
        store.put(keys::BROADCAST_KEY, &secret)?;
        info!(bytes = expected, "provisioned broadcast secret");
        Ok(true)
    }
}
