//! Lazy daily SK rotation.
//!
//! A [`KeyChain`] owns no state of its own: the SK and its last-rotation
//! date live in the identity's [`Store`]. Each access advances the stored SK
//! by the whole days elapsed since the stored date, so the SK is correct for
//! today no matter how long the identity was idle.
//!
//! ```text
//! first access:  SK₀ = source.initial_sk()   last_sk_update = today
//! later access:  SK  = H^days(SK_stored)     last_sk_update = today
//! ```

use chrono::NaiveDate;
use tracekey_crypto::{IdentityKeyPair, SK_SIZE, SecretKey, advance};
use tracing::debug;

use crate::{
    date,
    env::Environment,
    error::Error,
    store::{Store, keys},
};

/// Provider of an identity's first SK.
pub trait SkSource {
    /// SK used when the store holds none yet.
    fn initial_sk<E: Environment>(&self, env: &E) -> SecretKey;
}

/// Uniformly random initial SK, for identities that are not infected.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSk;

impl SkSource for RandomSk {
    fn initial_sk<E: Environment>(&self, env: &E) -> SecretKey {
        SecretKey::from_bytes(env.random_array::<SK_SIZE>())
    }
}

/// Infected identities start from `H(x ‖ y)` of their public key.
impl SkSource for IdentityKeyPair {
    fn initial_sk<E: Environment>(&self, _env: &E) -> SecretKey {
        IdentityKeyPair::initial_sk(self)
    }
}

/// Rotation engine over an SK persisted in a [`Store`].
#[derive(Debug, Clone)]
pub struct KeyChain<Src> {
    source: Src,
}

impl<Src: SkSource> KeyChain<Src> {
    /// Create a key chain seeded by `source`.
    pub fn new(source: Src) -> Self {
        Self { source }
    }

    /// The initial-SK provider.
    pub fn source(&self) -> &Src {
        &self.source
    }

    /// SK for `env.today()`, rotating and persisting it if days have passed.
    ///
    /// # Errors
    ///
    /// - `SizeMismatch`: if the stored SK is not 32 bytes
    /// - `CorruptState`: if the stored rotation date is unparsable
    /// - `Storage`: if the store fails
    pub fn current_sk<S: Store, E: Environment>(
        &self,
        store: &S,
        env: &E,
    ) -> Result<SecretKey, Error> {
        let today = env.today();
        let (bytes, created) = store.load_or_init(keys::SK, || {
            Ok::<_, Error>(self.source.initial_sk(env).as_bytes().to_vec())
        })?;
        let sk = SecretKey::from_slice(&bytes)?;

        if created {
            store.put(keys::LAST_SK_UPDATE, &date::encode(today))?;
            debug!(%today, "initialized SK");
            return Ok(sk);
        }

        let last_update = date::load_or_init(store, keys::LAST_SK_UPDATE, today)?;
        rotate(store, &sk, last_update, today)
    }
}

fn rotate<S: Store>(
    store: &S,
    sk: &SecretKey,
    last_update: NaiveDate,
    today: NaiveDate,
) -> Result<SecretKey, Error> {
    let days = date::elapsed_days(last_update, today);
    if days == 0 {
        return Ok(sk.clone());
    }

    let rotated = advance(sk, days);
    store.put(keys::SK, rotated.as_bytes())?;
    store.put(keys::LAST_SK_UPDATE, &date::encode(today))?;
    debug!(%last_update, %today, days, "rotated SK");

    Ok(rotated)
}
