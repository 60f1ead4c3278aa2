//! Sender identities: plain (random SK) and infected (SK bound to a key pair).

use tracekey_crypto::{EphId, IdentityKeyPair, PUBLIC_KEY_SIZE, SecretKey, Signature};
use tracing::info;

use crate::{
    env::Environment,
    error::Error,
    key_chain::{KeyChain, RandomSk},
    store::{Store, append_unique, keys},
};

/// Attempts at drawing a valid P-256 scalar before giving up.
///
/// A uniform 32-byte string is out of range with probability about 2⁻³², so
/// exhausting this is a broken RNG, not bad luck.
const KEY_GENERATION_ATTEMPTS: usize = 8;

/// Identity that is not infected: random initial SK, no signing key.
#[derive(Debug, Clone)]
pub struct PlainIdentity<S> {
    store: S,
    chain: KeyChain<RandomSk>,
}

impl<S: Store> PlainIdentity<S> {
    /// Open the identity whose state lives in `store`.
    pub fn open(store: S) -> Self {
        Self { store, chain: KeyChain::new(RandomSk) }
    }

    /// Backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// SK for today.
    pub fn current_sk<E: Environment>(&self, env: &E) -> Result<SecretKey, Error> {
        self.chain.current_sk(&self.store, env)
    }
}

/// Infected identity: P-256 key pair, SK starting at `H(x ‖ y)`.
///
/// # Invariants
///
/// - The persisted public key always matches the persisted private key
/// - The initial SK is derivable by anyone holding the public key
#[derive(Debug, Clone)]
pub struct InfectedIdentity<S> {
    store: S,
    chain: KeyChain<IdentityKeyPair>,
}

impl<S: Store> InfectedIdentity<S> {
    /// Open the identity in `store`, generating a key pair on first use.
    ///
    /// # Errors
    ///
    /// - `MissingRequiredState`: if an SK exists without its private key
    /// - `CorruptState`: if the stored public key does not match the private key
    /// - `SizeMismatch` / `InvalidKey`: if the stored private key is unusable
    pub fn open<E: Environment>(store: S, env: &E) -> Result<Self, Error> {
        let key_pair = load_or_generate_key_pair(&store, env)?;
        Ok(Self { store, chain: KeyChain::new(key_pair) })
    }

    /// Backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The identity's key pair.
    pub fn key_pair(&self) -> &IdentityKeyPair {
        self.chain.source()
    }

    /// Public key as `x ‖ y`.
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.key_pair().public_key_bytes()
    }

    /// Append the public key to `key` in `sink` unless already listed.
    ///
    /// Returns whether it was appended.
    pub fn export_public_key<T: Store>(&self, sink: &T, key: &'static str) -> Result<bool, Error> {
        append_unique(sink, key, &self.public_key_bytes())
    }

    /// SK for today.
    pub fn current_sk<E: Environment>(&self, env: &E) -> Result<SecretKey, Error> {
        self.chain.current_sk(&self.store, env)
    }

    /// Sign an EphID with the identity's private key.
    pub fn sign(&self, ephid: &EphId) -> Signature {
        self.key_pair().sign(ephid.as_bytes())
    }
}

fn load_or_generate_key_pair<S: Store, E: Environment>(
    store: &S,
    env: &E,
) -> Result<IdentityKeyPair, Error> {
    let Some(private_key) = store.get(keys::PRIVATE_KEY)? else {
        if store.get(keys::SK)?.is_some() {
            return Err(Error::MissingRequiredState { key: keys::PRIVATE_KEY });
        }
        return generate_key_pair(store, env);
    };

    let key_pair = IdentityKeyPair::from_private_bytes(&private_key)?;
    match store.get(keys::PUBLIC_KEY)? {
        Some(public_key) if public_key != key_pair.public_key_bytes() => {
            return Err(Error::CorruptState {
                key: keys::PUBLIC_KEY,
                reason: "does not match the private key".to_string(),
            });
        },
        Some(_) => {},
        None => store.put(keys::PUBLIC_KEY, &key_pair.public_key_bytes())?,
    }

    Ok(key_pair)
}

fn generate_key_pair<S: Store, E: Environment>(
    store: &S,
    env: &E,
) -> Result<IdentityKeyPair, Error> {
    for _ in 0..KEY_GENERATION_ATTEMPTS {
        let Ok(key_pair) = IdentityKeyPair::from_seed(&env.random_array::<32>()) else {
            continue;
        };

        store.put(keys::PRIVATE_KEY, &key_pair.private_key_bytes())?;
        store.put(keys::PUBLIC_KEY, &key_pair.public_key_bytes())?;
        info!(public_key = ?key_pair.public_key(), "generated identity key pair");
        return Ok(key_pair);
    }

    Err(Error::InvalidKey { reason: "random source produced no valid scalar" })
}

/// An identity chosen at runtime.
#[derive(Debug, Clone)]
pub enum Identity<S> {
    /// Not infected: sends the all-zero signature.
    Plain(PlainIdentity<S>),
    /// Infected: signs every EphID.
    Infected(InfectedIdentity<S>),
}

impl<S: Store> Identity<S> {
    /// Open a plain or infected identity over `store`.
    pub fn open<E: Environment>(store: S, infected: bool, env: &E) -> Result<Self, Error> {
        if infected {
            Ok(Self::Infected(InfectedIdentity::open(store, env)?))
        } else {
            Ok(Self::Plain(PlainIdentity::open(store)))
        }
    }

    /// Backing store.
    pub fn store(&self) -> &S {
        match self {
            Self::Plain(identity) => identity.store(),
            Self::Infected(identity) => identity.store(),
        }
    }

    /// SK for today.
    pub fn current_sk<E: Environment>(&self, env: &E) -> Result<SecretKey, Error> {
        match self {
            Self::Plain(identity) => identity.current_sk(env),
            Self::Infected(identity) => identity.current_sk(env),
        }
    }

    /// The infected identity, if this is one.
    pub fn as_infected(&self) -> Option<&InfectedIdentity<S>> {
        match self {
            Self::Plain(_) => None,
            Self::Infected(identity) => Some(identity),
        }
    }

    /// Signature over `ephid` when infected, [`Signature::ZERO`] otherwise.
    pub fn sign_or_sentinel(&self, ephid: &EphId) -> Signature {
        match self {
            Self::Plain(_) => Signature::ZERO,
            Self::Infected(identity) => identity.sign(ephid),
        }
    }
}

impl<S> From<PlainIdentity<S>> for Identity<S> {
    fn from(identity: PlainIdentity<S>) -> Self {
        Self::Plain(identity)
    }
}

impl<S> From<InfectedIdentity<S>> for Identity<S> {
    fn from(identity: InfectedIdentity<S>) -> Self {
        Self::Infected(identity)
    }
}
