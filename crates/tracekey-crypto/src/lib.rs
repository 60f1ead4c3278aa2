//! tracekey Cryptographic Primitives
//!
//! Cryptographic building blocks for the tracekey key schedule. Pure functions
//! with deterministic outputs. Callers provide random bytes (IVs, key seeds)
//! for deterministic testing.
//!
//! # Key Lifecycle
//!
//! Every identity holds a secret key (SK) that advances once per calendar day
//! along a one-way hash chain. The day's SK encrypts the broadcast secret
//! shared by all parties; the resulting ciphertext is sliced into the day's
//! ephemeral identifiers (EphIDs), one per broadcast window.
//!
//! ```text
//! SK(day 0) ──H──▶ SK(day 1) ──H──▶ SK(day 2) ...
//!      │
//!      ▼
//! AES-256-CBC(SK, IV, broadcast secret) → IV ‖ C₀ ‖ C₁ ‖ ... ‖ Cₙ₋₁
//!      │
//!      ▼
//! EphID for minute m = C[m / L]
//! ```
//!
//! Infected identities do not pick their initial SK at random: it is
//! `H(x ‖ y)` of their P-256 public point. Anyone holding only the public key
//! can therefore recompute the SK, regenerate the EphIDs, and verify the
//! ECDSA signature the infected sender attached to each broadcast.
//!
//! # Security
//!
//! Unlinkability:
//! - EphIDs are AES-CBC ciphertext blocks and look random without the SK
//! - Matching is brute force over every known infected SK
//!
//! Forward Secrecy:
//! - The hash chain is one-way: today's SK does not reveal yesterday's
//! - Secret keys are zeroized on drop
//!
//! Authenticity:
//! - Decryption only succeeds when the plaintext equals the broadcast secret;
//!   this known-plaintext check is the only integrity check on ciphertexts
//! - EphIDs broadcast by infected identities carry a deterministic
//!   (RFC 6979) ECDSA signature over SHA-256

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod chain;
pub mod cipher;
pub mod ephid;
pub mod error;
pub mod hash;
pub mod identity;
pub mod schedule;
pub mod signature;

pub use chain::{SK_SIZE, SecretKey, advance};
pub use cipher::{BLOCK_SIZE, BlockCipherCodec};
pub use ephid::{DailyCiphertext, EphId, split_ephids};
pub use error::CryptoError;
pub use hash::{DIGEST_SIZE, hash, hash_concat};
pub use identity::{COORDINATE_SIZE, IdentityKeyPair, PUBLIC_KEY_SIZE, PublicKey, derive_sk};
pub use schedule::{MINUTES_PER_DAY, Schedule};
pub use signature::{SIGNATURE_SIZE, Signature, sign, verify};
