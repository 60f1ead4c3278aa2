//! Daily ciphertext caching and EphID selection.

use tracekey_crypto::{BLOCK_SIZE, BlockCipherCodec, DailyCiphertext, EphId, Schedule, SecretKey};
use tracing::debug;

use crate::{
    date,
    env::Environment,
    error::Error,
    identity::Identity,
    store::{Store, keys},
};

/// Produces each identity's daily ciphertext and the EphID for the minute.
///
/// The ciphertext is computed at most once per calendar day and cached in
/// the identity's store, so every EphID broadcast on one day comes from the
/// same IV and SK.
#[derive(Clone)]
pub struct EphemeralIdScheduler {
    codec: BlockCipherCodec,
}

impl EphemeralIdScheduler {
    /// Create a scheduler over a codec holding the broadcast secret.
    pub fn new(codec: BlockCipherCodec) -> Self {
        Self { codec }
    }

    /// The codec in use.
    pub fn codec(&self) -> &BlockCipherCodec {
        &self.codec
    }

    /// EphID window configuration.
    pub fn schedule(&self) -> Schedule {
        self.codec.schedule()
    }

    /// Today's ciphertext for `identity`, from cache or freshly encrypted.
    ///
    /// The SK is always brought up to date first, so a cache miss encrypts
    /// under today's SK.
    ///
    /// # Errors
    ///
    /// - `SizeMismatch`: if the cached ciphertext has the wrong length
    /// - `CorruptState`: if a stored date is unparsable
    /// - any error from [`Identity::current_sk`]
    pub fn daily_ciphertext<S: Store, E: Environment>(
        &self,
        identity: &Identity<S>,
        env: &E,
    ) -> Result<DailyCiphertext, Error> {
        let store = identity.store();
        let today = env.today();
        let sk = identity.current_sk(env)?;

        if let Some(cached) = self.cached(store, today)? {
            return Ok(cached);
        }

        let iv = env.random_array::<BLOCK_SIZE>();
        let ciphertext = self.codec.encrypt(&sk, &iv);
        store.put(keys::CIPHERTEXT, ciphertext.as_bytes())?;
        store.put(keys::LAST_CIPHERTEXT_UPDATE, &date::encode(today))?;
        debug!(%today, "regenerated daily ciphertext");

        Ok(ciphertext)
    }

    fn cached<S: Store>(
        &self,
        store: &S,
        today: chrono::NaiveDate,
    ) -> Result<Option<DailyCiphertext>, Error> {
        let Some(bytes) = store.get(keys::CIPHERTEXT)? else {
            return Ok(None);
        };
        let Some(stamp) = store.get(keys::LAST_CIPHERTEXT_UPDATE)? else {
            return Ok(None);
        };

        if date::decode(keys::LAST_CIPHERTEXT_UPDATE, &stamp)? != today {
            return Ok(None);
        }
        Ok(Some(DailyCiphertext::from_bytes(self.schedule(), bytes)?))
    }

    /// EphID active at `minute` since midnight.
    pub fn active_ephid(&self, ciphertext: &DailyCiphertext, minute: u32) -> Result<EphId, Error> {
        Ok(ciphertext.active_ephid(minute)?)
    }

    /// All EphIDs of the day, in window order.
    pub fn all_ephids(&self, ciphertext: &DailyCiphertext) -> Result<Vec<EphId>, Error> {
        Ok(ciphertext.all_ephids()?)
    }

    /// The EphIDs an identity holding `sk` broadcasts on a day with `iv`.
    ///
    /// Receivers use this to recompute a candidate sender's day.
    pub fn ephids_for(&self, sk: &SecretKey, iv: &[u8; BLOCK_SIZE]) -> Result<Vec<EphId>, Error> {
        self.all_ephids(&self.codec.encrypt(sk, iv))
    }
}
