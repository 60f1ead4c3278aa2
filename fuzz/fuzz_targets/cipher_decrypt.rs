//! Fuzz target for the broadcast-secret codec
//!
//! # Strategy
//!
//! - Arbitrary SK, IV and window length drive a real encryption
//! - Arbitrary bytes, or the real ciphertext with one flipped bit, are
//!   decrypted under the same SK
//!
//! # Invariants
//!
//! - Decryption NEVER panics on malformed input
//! - The genuine ciphertext always decrypts to the broadcast secret
//! - A flipped bit is always rejected
//! - The EphIDs always partition the ciphertext body

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tracekey_crypto::{BLOCK_SIZE, BlockCipherCodec, CryptoError, SK_SIZE, Schedule, SecretKey};

const WINDOWS: [u32; 6] = [10, 15, 30, 60, 120, 1440];

#[derive(Debug, Arbitrary)]
struct Input {
    sk: [u8; SK_SIZE],
    iv: [u8; BLOCK_SIZE],
    window: u8,
    fill: u8,
    flip: u16,
    garbage: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let Ok(schedule) = Schedule::new(WINDOWS[usize::from(input.window) % WINDOWS.len()]) else {
        return;
    };
    let secret = vec![input.fill; schedule.broadcast_secret_len()];
    let Ok(codec) = BlockCipherCodec::new(schedule, secret) else {
        return;
    };
    let sk = SecretKey::from_bytes(input.sk);

    let _ = codec.decrypt(&sk, &input.garbage);

    let ciphertext = codec.encrypt(&sk, &input.iv);
    assert!(codec.decrypt(&sk, ciphertext.as_bytes()).is_ok());

    let ephids = ciphertext.all_ephids().unwrap_or_default();
    assert_eq!(ephids.len(), schedule.ephids_per_day());
    let joined: Vec<u8> = ephids.iter().flat_map(|ephid| *ephid.as_bytes()).collect();
    assert_eq!(joined.as_slice(), ciphertext.body());

    let mut tampered = ciphertext.as_bytes().to_vec();
    let bit = usize::from(input.flip) % (tampered.len() * 8);
    tampered[bit / 8] ^= 1 << (bit % 8);
    assert_eq!(codec.decrypt(&sk, &tampered), Err(CryptoError::InvalidCiphertext));
});
