//! Production Environment implementation using the local clock and OS RNG.
//!
//! Dates and minutes follow the machine's local time zone, so keys rotate at
//! local midnight.

use chrono::{Local, NaiveDate, Timelike};
use tracekey_core::Environment;

/// Production environment using the local clock and cryptographic RNG.
///
/// # Security
///
/// The RNG uses getrandom which provides OS-level cryptographic randomness
/// (e.g., /dev/urandom on Linux, `BCryptGenRandom` on Windows). Suitable for
/// SKs, IVs, private scalars and the broadcast secret.
///
/// # Panics
///
/// Panics if the OS RNG fails. A node without functioning cryptographic
/// randomness must not generate keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    #[allow(clippy::disallowed_methods)]
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    #[allow(clippy::disallowed_methods)]
    fn minutes_since_midnight(&self) -> u32 {
        let now = Local::now();
        now.hour() * 60 + now.minute()
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer)
            .expect("invariant: OS RNG failure is unrecoverable - node cannot generate keys");
    }
}
